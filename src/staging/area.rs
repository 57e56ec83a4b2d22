//! Staging area - repartitions a byte stream into fixed-size blocks.
//!
//! - `write()` - Feed buffers of any size
//! - `write_bounded()` - Same, sealing at most `max_in_flight` blocks per call
//! - `flush()` - Seal the final, possibly short, block
//!
//! # Example
//!
//! ```
//! use blockstage::{BufferStagingArea, StagingConfig};
//! use bytes::Bytes;
//!
//! let mut staging = BufferStagingArea::new(StagingConfig::new(4, 8)?)?;
//!
//! let blocks = staging.write(Bytes::from_static(b"abcdefghij"))?;
//! assert_eq!(blocks.len(), 2);
//!
//! let last = staging.flush()?;
//! assert_eq!(last.to_bytes(), Bytes::from_static(b"ij"));
//! # Ok::<(), blockstage::StagingError>(())
//! ```

use bytes::Bytes;
use tracing::{debug, trace};

use super::BufferAggregator;
use crate::checksum::Crc64;
use crate::config::StagingConfig;
use crate::error::StagingError;

/// Assembles fixed-size upload blocks from arbitrarily sized input buffers.
///
/// Exactly one aggregator is open at a time. When it reaches `chunk_size`
/// bytes it is sealed and returned, and a fresh one is opened for the rest
/// of the input. Input boundaries never show up in the output: every
/// returned block is exactly `chunk_size` bytes except the one returned by
/// [`flush`](Self::flush).
///
/// # Ordering
///
/// Blocks are returned in stream order with consecutive indices and
/// contiguous, non-overlapping ranges. Calls must be serialized by the
/// caller; sealed blocks may then be uploaded concurrently.
///
/// # Zero-Copy
///
/// Block contents are `Bytes` slices of the input buffers.
#[derive(Debug)]
pub struct BufferStagingArea {
    config: StagingConfig,
    current: BufferAggregator,
    offset: u64,
    next_index: usize,
    stream_crc: Option<Crc64>,
    finished: bool,
}

impl BufferStagingArea {
    /// Creates a staging area with the given configuration.
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(config: StagingConfig) -> Result<Self, StagingError> {
        config.validate()?;

        Ok(Self {
            current: BufferAggregator::at(config.chunk_size(), 0, 0),
            offset: 0,
            next_index: 0,
            stream_crc: config.checksum().enabled.then(Crc64::new),
            finished: false,
            config,
        })
    }

    /// Stages a buffer and returns every block it completed.
    ///
    /// A buffer larger than `chunk_size` may complete several blocks. Bytes
    /// that do not complete a block stay in the open aggregator.
    pub fn write(&mut self, data: Bytes) -> Result<Vec<BufferAggregator>, StagingError> {
        let (blocks, rest) = self.stage(data, usize::MAX)?;
        debug_assert!(rest.is_empty());
        Ok(blocks)
    }

    /// Stages a buffer, sealing at most `max_in_flight` blocks.
    ///
    /// Returns the sealed blocks and the unconsumed tail of `data`.
    ///
    /// # Important
    ///
    /// - **Always feed the returned `Bytes` back** before any new input
    /// - Skipping it drops those bytes from the upload
    pub fn write_bounded(
        &mut self,
        data: Bytes,
    ) -> Result<(Vec<BufferAggregator>, Bytes), StagingError> {
        self.stage(data, self.config.max_in_flight())
    }

    fn stage(
        &mut self,
        mut data: Bytes,
        limit: usize,
    ) -> Result<(Vec<BufferAggregator>, Bytes), StagingError> {
        if self.finished {
            return Err(StagingError::Finished);
        }

        let mut blocks = Vec::new();
        while !data.is_empty() && blocks.len() < limit {
            let take = self.current.remaining_capacity().min(data.len());
            self.current.append(data.split_to(take))?;
            self.offset += take as u64;

            if self.current.remaining_capacity() == 0 {
                blocks.push(self.seal_current());
            }
        }

        Ok((blocks, data))
    }

    /// Seals and returns the open aggregator, even if short or empty.
    ///
    /// Call once, after the last write. The staging area is finished
    /// afterwards; use [`reset`](Self::reset) to stage another stream.
    pub fn flush(&mut self) -> Result<BufferAggregator, StagingError> {
        if self.finished {
            return Err(StagingError::Finished);
        }
        self.finished = true;

        let block = self.seal_current();
        debug!(
            blocks = self.next_index,
            total = self.offset,
            last_len = block.len(),
            "staging area flushed"
        );
        Ok(block)
    }

    fn seal_current(&mut self) -> BufferAggregator {
        let fresh = BufferAggregator::at(self.config.chunk_size(), self.next_index + 1, self.offset);
        let mut block = std::mem::replace(&mut self.current, fresh);
        self.next_index += 1;

        block.seal(self.config.checksum().enabled);
        if let (Some(stream), Some(crc)) = (self.stream_crc.as_mut(), block.crc64()) {
            stream.combine(&Crc64::from_parts(0, crc, block.len() as u64));
        }

        trace!(
            index = block.index(),
            offset = block.offset(),
            len = block.len(),
            "sealed block"
        );
        block
    }

    /// Returns the CRC64 of everything sealed so far.
    ///
    /// `None` when checksums are disabled. After [`flush`](Self::flush) this
    /// is the checksum of the whole stream.
    pub fn stream_crc64(&self) -> Option<u64> {
        self.stream_crc.map(|crc| crc.value())
    }

    /// Resets the staging area for a new stream.
    pub fn reset(&mut self) {
        self.current = BufferAggregator::at(self.config.chunk_size(), 0, 0);
        self.offset = 0;
        self.next_index = 0;
        self.stream_crc = self.config.checksum().enabled.then(Crc64::new);
        self.finished = false;
    }

    /// Returns the total number of bytes accepted.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the number of bytes in the open aggregator.
    pub fn pending_len(&self) -> usize {
        self.current.len()
    }

    /// Returns the number of blocks sealed so far.
    pub fn blocks_emitted(&self) -> usize {
        self.next_index
    }

    /// Returns true once [`flush`](Self::flush) was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the configuration used by this staging area.
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }
}
