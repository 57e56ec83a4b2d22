//! CRC64 checksums for upload blocks.
//!
//! - [`crc64`] - Direct computation and algebraic concatenation
//! - [`Crc64`] - Streaming hasher
//! - [`BlockChecksums`] - Combine per-block checksums in block order

pub mod crc64;
mod compose;

pub use compose::BlockChecksums;
pub use crc64::Crc64;
