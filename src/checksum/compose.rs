//! Ordered composition of per-block checksums.

use std::collections::BTreeMap;

use super::crc64;
use crate::error::ChecksumError;

/// Collects block checksums in completion order and combines them in block
/// order.
///
/// Blocks uploaded in parallel finish in any order; only their index and
/// length are needed to fold them into a whole-stream CRC64.
///
/// # Example
///
/// ```
/// use blockstage::{crc64, BlockChecksums};
///
/// let mut checksums = BlockChecksums::new();
/// checksums.insert(1, crc64::compute(b"world", 0), 5)?;
/// checksums.insert(0, crc64::compute(b"hello ", 0), 6)?;
///
/// let (crc, len) = checksums.combined()?;
/// assert_eq!(crc, crc64::compute(b"hello world", 0));
/// assert_eq!(len, 11);
/// # Ok::<(), blockstage::ChecksumError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlockChecksums {
    blocks: BTreeMap<usize, (u64, u64)>,
}

impl BlockChecksums {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the zero-seeded checksum and length of block `index`.
    pub fn insert(&mut self, index: usize, crc: u64, len: u64) -> Result<(), ChecksumError> {
        if self.blocks.contains_key(&index) {
            return Err(ChecksumError::DuplicateBlock { index });
        }
        self.blocks.insert(index, (crc, len));
        Ok(())
    }

    /// Returns the number of recorded blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Combines blocks `0..n` into `(crc, total_len)`.
    ///
    /// Fails with the first missing index if the recorded indices have a gap.
    pub fn combined(&self) -> Result<(u64, u64), ChecksumError> {
        let mut crc = 0;
        let mut total = 0;
        for (expected, (&index, &(block_crc, len))) in self.blocks.iter().enumerate() {
            if index != expected {
                return Err(ChecksumError::MissingBlock { index: expected });
            }
            crc = crc64::concat(0, 0, crc, total, 0, block_crc, len);
            total += len;
        }
        Ok((crc, total))
    }
}
