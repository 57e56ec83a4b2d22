#![no_main]

use libfuzzer_sys::fuzz_target;
use blockstage::{ChannelConfig, MemoryResource, SeekableByteChannel};

// Each op is (seek target, write length); the model is a plain Vec<u8>.
fuzz_target!(|input: (u8, Vec<(u16, u8)>)| {
    let (buffer_len, ops) = input;
    let config = ChannelConfig::new(usize::from(buffer_len).max(1)).unwrap();

    let mut model: Vec<u8> = Vec::new();
    let mut resource = MemoryResource::new();
    {
        let mut channel = SeekableByteChannel::for_write(config, &mut resource).unwrap();
        for (i, (position, len)) in ops.into_iter().enumerate() {
            let position = u64::from(position);
            channel.set_position(position).unwrap();

            let src = vec![i as u8; usize::from(len)];
            let mut written = 0;
            while written < src.len() {
                written += channel.write(&src[written..]).unwrap();
            }

            let start = position as usize;
            if model.len() < start + src.len() {
                model.resize(start + src.len(), 0);
            }
            model[start..start + src.len()].copy_from_slice(&src);
        }
        channel.close().unwrap();
    }
    assert_eq!(resource.data(), &model[..]);

    // Read back through a channel of the same window length
    let mut channel = SeekableByteChannel::for_read(config, resource).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 97];
    while let Some(n) = channel.read(&mut buf).unwrap() {
        out.extend_from_slice(&buf[..n]);
    }
    assert_eq!(out, model);
});
