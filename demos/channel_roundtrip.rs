//! Seekable channel example.
//!
//! Writes a small page-aligned resource through a write channel, patches
//! one page with a seek, and reads pieces back at random offsets.
//!
//! Run with:
//!     RUST_LOG=blockstage=debug cargo run --example channel_roundtrip

use std::io::{Read, Seek, SeekFrom, Write};

use blockstage::{ChannelConfig, ChannelError, MemoryResource, SeekableByteChannel};
use tracing_subscriber::EnvFilter;

const PAGE: u64 = 512;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut resource = MemoryResource::new().with_seek_alignment(PAGE);
    {
        let config = ChannelConfig::new(4 * PAGE as usize)?;
        let mut writer = SeekableByteChannel::for_write(config, &mut resource)?;

        // Eight pages, each filled with its page number
        for page in 0..8u8 {
            writer.write_all(&[page; PAGE as usize])?;
        }

        // Page resources refuse unaligned positions
        match writer.set_position(100) {
            Err(ChannelError::UnsupportedSeek { position, reason }) => {
                println!("Seek to {} rejected: {}", position, reason);
            }
            other => println!("Unexpected seek result: {:?}", other),
        }

        writer.seek(SeekFrom::Start(3 * PAGE))?;
        writer.write_all(&[0xFF; PAGE as usize])?;
        writer.close()?;
    }
    println!("Committed {:?} bytes", resource.committed_len());

    let mut reader = SeekableByteChannel::for_read(ChannelConfig::new(PAGE as usize)?, resource)?;
    for offset in [0, 3 * PAGE + 10, 7 * PAGE - 4] {
        let mut buf = [0u8; 8];
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut buf)?;
        println!("@{:>5}: {:02x?}", offset, buf);
    }

    Ok(())
}
