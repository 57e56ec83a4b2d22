//! blockstage
//!
//! Upload block staging, composable CRC64 checksums and a seekable
//! window-buffered byte channel for blob storage clients.
//!
//! `blockstage` sits between a transport and the code producing or consuming
//! bytes. It is designed as a small set of composable primitives:
//!
//! - staging arbitrarily sized buffers into fixed-size upload blocks
//! - checksumming blocks independently and combining the results
//! - random-access reads and writes over ranged remote I/O
//!
//! The crate intentionally:
//! - does NOT speak HTTP or any wire protocol
//! - does NOT retry or back off
//! - does NOT manage concurrency
//! - does NOT handle credentials
//!
//! I/O reaches a resource only through [`ReadBehavior`] and
//! [`WriteBehavior`], which the transport implements.
//!
//! # Staging
//!
//! ```
//! use blockstage::{BufferStagingArea, StagingConfig, crc64};
//! use bytes::Bytes;
//!
//! let mut staging = BufferStagingArea::new(StagingConfig::new(4, 8)?)?;
//!
//! let mut blocks = Vec::new();
//! for part in [&b"abc"[..], &b"defgh"[..], &b"ij"[..]] {
//!     blocks.extend(staging.write(Bytes::copy_from_slice(part))?);
//! }
//! blocks.push(staging.flush()?);
//!
//! let sizes: Vec<_> = blocks.iter().map(|b| b.len()).collect();
//! assert_eq!(sizes, [4, 4, 2]);
//! assert_eq!(staging.stream_crc64(), Some(crc64::compute(b"abcdefghij", 0)));
//! # Ok::<(), blockstage::StagingError>(())
//! ```
//!
//! # Seekable channel
//!
//! ```
//! use blockstage::{ChannelConfig, MemoryResource, SeekableByteChannel};
//! use std::io::{Read, Write};
//!
//! let mut resource = MemoryResource::new();
//! let mut writer = SeekableByteChannel::for_write(ChannelConfig::new(8)?, &mut resource)?;
//! writer.write_all(b"hello, seekable world")?;
//! writer.close()?;
//! drop(writer);
//!
//! let mut reader = SeekableByteChannel::for_read(ChannelConfig::new(8)?, resource)?;
//! reader.set_position(7)?;
//! let mut word = String::new();
//! reader.read_to_string(&mut word)?;
//! assert_eq!(word, "seekable world");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use blockstage::{stage_async, StagingConfig};
//! use tokio_util::compat::TokioAsyncReadCompatExt;
//!
//! async fn demo(file: tokio::fs::File) -> Result<(), blockstage::StagingError> {
//!     let mut blocks = stage_async(file.compat(), StagingConfig::default())?;
//!
//!     while let Some(block) = blocks.next().await {
//!         let block = block?;
//!         println!("block {} crc64={:?}", block.index(), block.crc64());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod checksum;
mod config;
mod error;
mod staging;

mod util; // internal helpers

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use channel::{MemoryResource, ReadBehavior, SeekableByteChannel, WriteBehavior};
pub use checksum::{BlockChecksums, Crc64, crc64};
pub use config::{
    ChannelConfig, ChecksumConfig, DEFAULT_BUFFER_LEN, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_IN_FLIGHT,
    StagingConfig,
};
pub use error::{ChannelError, ChecksumError, SeekRejected, StagingError};
pub use staging::{BufferAggregator, BufferStagingArea};

#[cfg(feature = "async-io")]
pub use async_stream::{ReaderStream, StageStream, stage_async, stage_stream};
