//! Async staging example.
//!
//! Stages a tokio file into upload blocks without blocking the runtime.
//!
//! Run with:
//!     cargo run --example async_stage --features async-io -- <FILE>

use futures_util::StreamExt;
use tokio_util::compat::TokioAsyncReadCompatExt;

use blockstage::{StagingConfig, stage_async};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).ok_or("usage: async_stage <FILE>")?;
    let file = tokio::fs::File::open(&path).await?;

    let mut blocks = stage_async(file.compat(), StagingConfig::default())?;

    let mut count = 0;
    let mut total = 0;
    while let Some(block) = blocks.next().await {
        let block = block?;
        println!(
            "Block {}: offset={}, len={}, crc64={:016x}",
            block.index(),
            block.offset(),
            block.len(),
            block.crc64().unwrap_or_default()
        );
        count += 1;
        total += block.len();
    }

    println!("\nStaged {} bytes of {} into {} blocks", total, path, count);
    if let Some(crc) = blocks.stream_crc64() {
        println!("Stream crc64: {:016x}", crc);
    }

    Ok(())
}
