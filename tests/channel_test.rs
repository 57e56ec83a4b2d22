// Integration tests for the seekable byte channel
// Tests cover: round trips, std::io seeking, write retries, alignment, end of resource

use std::io::{self, Read, Seek, SeekFrom, Write};

use blockstage::{
    ChannelConfig, ChannelError, MemoryResource, ReadBehavior, SeekableByteChannel, WriteBehavior,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

fn config(buffer_len: usize) -> ChannelConfig {
    ChannelConfig::new(buffer_len).unwrap()
}

fn write_through(data: &[u8], buffer_len: usize) -> MemoryResource {
    let mut resource = MemoryResource::new();
    {
        let mut channel = SeekableByteChannel::for_write(config(buffer_len), &mut resource).unwrap();
        channel.write_all(data).unwrap();
        channel.close().unwrap();
    }
    resource
}

fn read_through(resource: MemoryResource, buffer_len: usize) -> Vec<u8> {
    let mut channel = SeekableByteChannel::for_read(config(buffer_len), resource).unwrap();
    let mut out = Vec::new();
    channel.read_to_end(&mut out).unwrap();
    out
}

/// Fails the next `failures` writes, then stores into an inner resource.
struct FlakyResource {
    inner: MemoryResource,
    failures: usize,
    attempts: usize,
}

impl WriteBehavior for FlakyResource {
    fn write(&mut self, src: &[u8], offset: u64) -> io::Result<()> {
        self.attempts += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(io::ErrorKind::TimedOut, "transient"));
        }
        WriteBehavior::write(&mut self.inner, src, offset)
    }
}

/// Serves reads without ever reporting a length.
struct Unsized(MemoryResource);

impl ReadBehavior for Unsized {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> io::Result<usize> {
        ReadBehavior::read(&mut self.0, dst, offset)
    }

    fn resource_length(&self) -> Option<u64> {
        None
    }
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_round_trip_sizes() {
    let mut rng = StdRng::seed_from_u64(11);

    // (data length, window length)
    for (len, buffer_len) in [(4096, 512), (4000, 512), (100, 4096), (0, 64), (1, 1), (513, 512)] {
        let data: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        let resource = write_through(&data, buffer_len);

        assert_eq!(resource.data(), &data[..], "write len={} buf={}", len, buffer_len);
        assert_eq!(resource.committed_len(), Some(len as u64));
        assert_eq!(read_through(resource, buffer_len), data, "read len={} buf={}", len, buffer_len);
    }
}

#[test]
fn test_round_trip_unknown_length() {
    let data: Vec<u8> = (0..3000).map(|i| (i % 251) as u8).collect();
    let resource = write_through(&data, 700);

    let mut channel = SeekableByteChannel::for_read(config(512), Unsized(resource)).unwrap();
    let mut out = Vec::new();
    channel.read_to_end(&mut out).unwrap();

    assert_eq!(out, data);
    assert_eq!(channel.size(), data.len() as u64);
}

// ============================================================================
// Seeking
// ============================================================================

#[test]
fn test_seek_from_all_origins() {
    let data: Vec<u8> = (0..=255).collect();
    let mut channel =
        SeekableByteChannel::for_read(config(64), MemoryResource::from_bytes(data.clone())).unwrap();

    let mut byte = [0u8; 1];

    assert_eq!(channel.seek(SeekFrom::Start(100)).unwrap(), 100);
    channel.read_exact(&mut byte).unwrap();
    assert_eq!(byte[0], 100);

    assert_eq!(channel.seek(SeekFrom::Current(-51)).unwrap(), 50);
    channel.read_exact(&mut byte).unwrap();
    assert_eq!(byte[0], 50);

    assert_eq!(channel.seek(SeekFrom::End(-1)).unwrap(), 255);
    channel.read_exact(&mut byte).unwrap();
    assert_eq!(byte[0], 255);

    let err = channel.seek(SeekFrom::Current(-1000)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert_eq!(channel.stream_position().unwrap(), 256);
}

#[test]
fn test_random_reads_match_resource() {
    let mut rng = StdRng::seed_from_u64(12);
    let data: Vec<u8> = (0..10_000).map(|_| rng.r#gen()).collect();
    let mut channel =
        SeekableByteChannel::for_read(config(1024), MemoryResource::from_bytes(data.clone()))
            .unwrap();

    for _ in 0..200 {
        let start = rng.gen_range(0..data.len());
        let len = rng.gen_range(1..=2048).min(data.len() - start);
        let mut buf = vec![0u8; len];

        channel.set_position(start as u64).unwrap();
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(buf, &data[start..start + len], "read {}..{}", start, start + len);
    }
}

#[test]
fn test_write_seek_patches_earlier_bytes() {
    let mut resource = MemoryResource::from_bytes(vec![b'.'; 16]);
    {
        let mut channel = SeekableByteChannel::for_write(config(4), &mut resource).unwrap();
        channel.write_all(b"abcdefgh").unwrap();
        channel.seek(SeekFrom::Start(2)).unwrap();
        channel.write_all(b"XY").unwrap();
        channel.seek(SeekFrom::Start(12)).unwrap();
        channel.write_all(b"tail").unwrap();
        channel.close().unwrap();
    }
    assert_eq!(resource.data(), b"abXYefgh....tail");
}

#[test]
fn test_aligned_resource_rejects_unaligned_seek() {
    let mut resource = MemoryResource::new().with_seek_alignment(512);
    let mut channel = SeekableByteChannel::for_write(config(512), &mut resource).unwrap();
    channel.write_all(&[7u8; 100]).unwrap();

    let err = channel.set_position(100).unwrap_err();
    assert!(matches!(err, ChannelError::UnsupportedSeek { position: 100, .. }));
    assert_eq!(channel.position(), 100, "rejected seek leaves position alone");

    channel.set_position(1024).unwrap();
    channel.write_all(&[9u8; 512]).unwrap();
    channel.close().unwrap();
    drop(channel);

    assert_eq!(resource.data().len(), 1536);
    assert!(resource.data()[100..1024].iter().all(|&b| b == 0));
}

#[test]
fn test_aligned_resource_rejects_unaligned_start() {
    let mut resource = MemoryResource::new().with_seek_alignment(512);
    let result = SeekableByteChannel::for_write(
        config(512).with_starting_position(10),
        &mut resource,
    );
    assert!(matches!(result, Err(ChannelError::UnsupportedSeek { position: 10, .. })));
}

// ============================================================================
// Write Retries
// ============================================================================

#[test]
fn test_failed_window_flush_is_retryable() {
    let mut resource = FlakyResource {
        inner: MemoryResource::new(),
        failures: 1,
        attempts: 0,
    };
    let data = [0x42u8; 1024];
    {
        let mut channel = SeekableByteChannel::for_write(config(1024), &mut resource).unwrap();

        let err = channel.write(&data).unwrap_err();
        assert!(matches!(err, ChannelError::Io(_)));
        assert_eq!(channel.position(), 0);

        assert_eq!(channel.write(&data).unwrap(), 1024);
        assert_eq!(channel.position(), 1024);
        channel.close().unwrap();
    }
    assert_eq!(resource.attempts, 2);
    assert_eq!(resource.inner.data(), &data[..]);
}

#[test]
fn test_failed_close_keeps_channel_open() {
    let mut resource = FlakyResource {
        inner: MemoryResource::new(),
        failures: 1,
        attempts: 0,
    };
    {
        let mut channel = SeekableByteChannel::for_write(config(64), &mut resource).unwrap();
        channel.write_all(b"pending").unwrap();

        assert!(channel.close().is_err());
        assert!(channel.is_open());
        channel.close().unwrap();
        assert!(!channel.is_open());
    }
    assert_eq!(resource.inner.data(), b"pending");
}

// ============================================================================
// End of Resource
// ============================================================================

#[test]
fn test_read_at_end_returns_none() {
    let mut channel =
        SeekableByteChannel::for_read(config(8), MemoryResource::from_bytes(b"abc".to_vec()))
            .unwrap();
    let mut buf = [0u8; 8];

    assert_eq!(channel.read(&mut buf).unwrap(), Some(3));
    assert_eq!(channel.read(&mut buf).unwrap(), None);

    channel.set_position(1000).unwrap();
    assert_eq!(channel.read(&mut buf).unwrap(), None);
    assert_eq!(Read::read(&mut channel, &mut buf).unwrap(), 0);
}

#[test]
fn test_wrong_mode_is_rejected() {
    let mut reader =
        SeekableByteChannel::for_read(config(8), MemoryResource::from_bytes(b"abc".to_vec()))
            .unwrap();
    assert!(matches!(reader.write(b"x"), Err(ChannelError::NonWritableChannel)));

    let mut sink = MemoryResource::new();
    let mut writer = SeekableByteChannel::for_write(config(8), &mut sink).unwrap();
    let mut buf = [0u8; 1];
    assert!(matches!(writer.read(&mut buf), Err(ChannelError::NonReadableChannel)));

    let err = Write::write(&mut reader, b"x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

// ============================================================================
// Properties
// ============================================================================

/// Writes `data` with `write` calls cycling through `sizes`.
fn write_in_calls(data: &[u8], buffer_len: usize, sizes: &[usize]) -> MemoryResource {
    let mut resource = MemoryResource::new();
    {
        let mut channel = SeekableByteChannel::for_write(config(buffer_len), &mut resource).unwrap();
        let mut sizes = sizes.iter().cycle();
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + sizes.next().unwrap()).min(data.len());
            let mut call = &data[offset..end];
            while !call.is_empty() {
                let n = channel.write(call).unwrap();
                assert!(n > 0, "window always has room after a flush");
                call = &call[n..];
            }
            offset = end;
        }
        channel.close().unwrap();
    }
    resource
}

proptest! {
    /// Independently sized write and read calls round-trip any window.
    #[test]
    fn round_trip_any_call_sizes(
        data in prop::collection::vec(any::<u8>(), 0..3000),
        write_len in 1usize..700,
        read_len in 1usize..700,
        write_sizes in prop::collection::vec(1usize..900, 1..20),
        read_sizes in prop::collection::vec(1usize..900, 1..20),
    ) {
        let resource = write_in_calls(&data, write_len, &write_sizes);
        prop_assert_eq!(resource.data(), &data[..]);
        prop_assert_eq!(resource.committed_len(), Some(data.len() as u64));

        let mut channel = SeekableByteChannel::for_read(config(read_len), resource).unwrap();
        let mut out = Vec::with_capacity(data.len());
        for &size in read_sizes.iter().cycle() {
            let mut buf = vec![0u8; size];
            match channel.read(&mut buf).unwrap() {
                Some(n) => {
                    prop_assert!(n > 0 && n <= size);
                    out.extend_from_slice(&buf[..n]);
                }
                None => break,
            }
        }
        prop_assert_eq!(out, data);
        prop_assert_eq!(channel.position(), channel.size());
    }

    #[test]
    fn round_trip_any_window(
        data in prop::collection::vec(any::<u8>(), 0..3000),
        write_len in 1usize..1500,
        read_len in 1usize..1500,
    ) {
        let resource = write_through(&data, write_len);
        prop_assert_eq!(resource.data(), &data[..]);
        prop_assert_eq!(read_through(resource, read_len), data);
    }
}
