//! Staged block upload example.
//!
//! Stages a stream into fixed-size blocks, "uploads" them on worker threads
//! and verifies the whole-stream CRC64 from the per-block checksums as the
//! uploads complete in arbitrary order.
//!
//! Run with:
//!     RUST_LOG=blockstage=trace cargo run --example stage_upload [FILE]

use std::fs::File;
use std::io::Read;
use std::sync::mpsc;
use std::thread;

use bytes::Bytes;
use blockstage::{BlockChecksums, BufferAggregator, BufferStagingArea, StagingConfig, crc64};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Read a file if given, else generate 10 MB of sample data
    let data = match std::env::args().nth(1) {
        Some(path) => {
            let mut buf = Vec::new();
            File::open(path)?.read_to_end(&mut buf)?;
            buf
        }
        None => (0..10 * 1024 * 1024).map(|i| (i * 31 % 251) as u8).collect(),
    };

    let config = StagingConfig::new(1024 * 1024, 4)?;
    let mut staging = BufferStagingArea::new(config)?;
    let (tx, rx) = mpsc::channel();

    println!("Staging {} bytes into {} byte blocks...\n", data.len(), config.chunk_size());

    let data = Bytes::from(data);
    let mut workers = Vec::new();
    let mut upload = |block: BufferAggregator| {
        let tx = tx.clone();
        workers.push(thread::spawn(move || {
            // Stand-in for a block PUT
            let crc = block.compute_crc64();
            tx.send((block.index(), crc, block.len() as u64)).ok();
        }));
    };

    // Feed the stream in 64 KB pieces
    for start in (0..data.len()).step_by(64 * 1024) {
        let end = (start + 64 * 1024).min(data.len());
        for block in staging.write(data.slice(start..end))? {
            upload(block);
        }
    }
    let last = staging.flush()?;
    if !last.is_empty() || staging.blocks_emitted() == 1 {
        upload(last);
    }
    drop(upload);
    drop(tx);

    let mut checksums = BlockChecksums::new();
    for (index, crc, len) in rx {
        println!("Block {:>3}: {:>8} bytes, crc64={:016x}", index, len, crc);
        checksums.insert(index, crc, len)?;
    }
    for worker in workers {
        worker.join().map_err(|_| "upload worker panicked")?;
    }

    let (combined, total) = checksums.combined()?;
    println!("\nSummary:");
    println!("  Blocks: {}", checksums.len());
    println!("  Bytes: {}", total);
    println!("  Combined crc64: {:016x}", combined);
    println!("  Direct crc64:   {:016x}", crc64::compute(&data, 0));
    assert_eq!(Some(combined), staging.stream_crc64());

    Ok(())
}
