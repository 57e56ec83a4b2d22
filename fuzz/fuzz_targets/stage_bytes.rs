#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use blockstage::{BufferStagingArea, StagingConfig, crc64};

fuzz_target!(|input: (u8, Vec<u16>, Vec<u8>)| {
    let (chunk_size, cuts, data) = input;
    let chunk_size = usize::from(chunk_size).max(1);
    let config = StagingConfig::new(chunk_size, 4).unwrap();

    // Split the data at the fuzzed cut points
    let mut cuts: Vec<usize> = cuts.iter().map(|&c| usize::from(c) % (data.len() + 1)).collect();
    cuts.sort_unstable();
    let data = Bytes::from(data);

    let mut staging = BufferStagingArea::new(config).unwrap();
    let mut blocks = Vec::new();
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(data.len())) {
        blocks.extend(staging.write(data.slice(start..cut)).unwrap());
        start = cut;
    }
    blocks.push(staging.flush().unwrap());

    // Verify: every block but the last is full
    let (last, full) = blocks.split_last().unwrap();
    assert!(full.iter().all(|b| b.len() == chunk_size));
    assert!(last.len() <= chunk_size);

    // Verify: offsets are contiguous and bytes are preserved
    let mut joined = Vec::with_capacity(data.len());
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.index(), i);
        assert_eq!(block.offset(), joined.len() as u64);
        joined.extend_from_slice(&block.to_bytes());
    }
    assert_eq!(joined, data);

    // Verify: combined block checksums equal the whole-stream checksum
    assert_eq!(staging.stream_crc64(), Some(crc64::compute(&data, 0)));
});
