// Integration tests for the async staging adapters
// Tests cover: backpressure, pending upstreams, reader staging

#![cfg(feature = "async-io")]

use std::io;

use bytes::Bytes;
use blockstage::{StagingConfig, crc64, stage_async, stage_stream};
use futures_util::StreamExt;
use futures_util::stream;
use tokio_test::{assert_pending, assert_ready, task};

fn config(chunk_size: usize, max_in_flight: usize) -> StagingConfig {
    StagingConfig::new(chunk_size, max_in_flight).unwrap()
}

#[test]
fn test_pending_upstream_is_pending() {
    let upstream = stream::pending::<Result<Bytes, io::Error>>();
    let mut blocks = task::spawn(stage_stream(upstream, config(4, 2)).unwrap());

    assert_pending!(blocks.poll_next());
}

#[test]
fn test_queued_blocks_served_before_upstream() {
    // One large buffer, then an upstream that never finishes
    let upstream = stream::iter(vec![Ok::<_, io::Error>(Bytes::from(vec![1u8; 40]))])
        .chain(stream::pending());
    let mut blocks = task::spawn(stage_stream(upstream, config(4, 3)).unwrap());

    for _ in 0..10 {
        let block = assert_ready!(blocks.poll_next()).unwrap().unwrap();
        assert_eq!(block.len(), 4);
        assert!(blocks.queued_blocks() < 3);
    }
    assert_pending!(blocks.poll_next());
}

#[test]
fn test_partial_block_waits_for_more_input() {
    let upstream = stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(b"abcdef"))])
        .chain(stream::pending());
    let mut blocks = task::spawn(stage_stream(upstream, config(4, 2)).unwrap());

    let first = assert_ready!(blocks.poll_next()).unwrap().unwrap();
    assert_eq!(first.to_bytes(), Bytes::from_static(b"abcd"));
    assert_pending!(blocks.poll_next());
}

#[tokio::test]
async fn test_stage_async_matches_sync_checksum() {
    let data: Vec<u8> = (0..200_000).map(|i| (i * 13 % 256) as u8).collect();
    let reader: &[u8] = &data;
    let mut blocks = stage_async(reader, config(65_536, 2)).unwrap();

    let mut sizes = Vec::new();
    let mut joined = Vec::new();
    while let Some(block) = blocks.next().await {
        let block = block.unwrap();
        sizes.push(block.len());
        joined.extend_from_slice(&block.to_bytes());
    }

    assert_eq!(sizes, vec![65_536, 65_536, 65_536, 3_392]);
    assert_eq!(joined, data);
    assert_eq!(blocks.stream_crc64(), Some(crc64::compute(&data, 0)));
}
