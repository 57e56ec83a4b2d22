//! The BufferAggregator type - one upload block under assembly.

use std::collections::VecDeque;
use std::fmt;

use bytes::{Buf, Bytes};

use crate::checksum::crc64;
use crate::error::StagingError;
use crate::util;

/// A fixed-capacity run of appended buffers forming one upload block.
///
/// Appended buffers are stored as `Bytes` views, never copied. Reads drain
/// from the front through a cursor: a byte handed out by
/// [`get_first_n_bytes`](Self::get_first_n_bytes) or the [`Buf`] impl is
/// never handed out again.
///
/// # Example
///
/// ```
/// use blockstage::BufferAggregator;
/// use bytes::Bytes;
///
/// let mut block = BufferAggregator::new(16);
/// block.append(Bytes::from_static(b"hello "))?;
/// block.append(Bytes::from_static(b"world"))?;
///
/// assert_eq!(block.len(), 11);
/// assert_eq!(block.get_first_n_bytes(8), Bytes::from_static(b"hello wo"));
/// assert_eq!(block.get_first_n_bytes(8), Bytes::from_static(b"rld"));
/// assert!(block.get_first_n_bytes(8).is_empty());
/// # Ok::<(), blockstage::StagingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BufferAggregator {
    capacity: usize,
    buffers: VecDeque<Bytes>,
    length: usize,
    drained: usize,
    index: usize,
    offset: u64,
    crc64: Option<u64>,
    sealed: bool,
}

impl BufferAggregator {
    /// Creates an empty aggregator holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::at(capacity, 0, 0)
    }

    /// Creates an aggregator for block `index` starting at stream `offset`.
    pub(crate) fn at(capacity: usize, index: usize, offset: u64) -> Self {
        Self {
            capacity,
            buffers: VecDeque::new(),
            length: 0,
            drained: 0,
            index,
            offset,
            crc64: None,
            sealed: false,
        }
    }

    /// Appends a buffer.
    ///
    /// Fails without storing anything if the total would exceed the capacity
    /// or the aggregator is sealed.
    pub fn append(&mut self, buffer: Bytes) -> Result<(), StagingError> {
        if self.sealed {
            return Err(StagingError::Sealed);
        }

        let attempted = self.length + buffer.len();
        if attempted > self.capacity {
            return Err(StagingError::CapacityExceeded {
                capacity: self.capacity,
                attempted,
            });
        }

        if !buffer.is_empty() {
            self.length = attempted;
            self.buffers.push_back(buffer);
        }
        Ok(())
    }

    /// Returns the next `n` unread bytes, or fewer if less remain.
    ///
    /// Zero-copy when the bytes lie inside one appended buffer. Returns an
    /// empty `Bytes` once everything was drained.
    pub fn get_first_n_bytes(&mut self, n: usize) -> Bytes {
        let n = n.min(self.remaining());
        if n == 0 {
            return Bytes::new();
        }

        if let Some(front) = self.buffers.front_mut() {
            if front.len() >= n {
                let out = front.split_to(n);
                if front.is_empty() {
                    self.buffers.pop_front();
                }
                self.drained += n;
                return out;
            }
        }

        let out = util::gather(self.buffers.iter().map(|b| b.as_ref()), n);
        self.advance_cursor(n);
        out
    }

    /// Iterates the unread bytes as views into the appended buffers.
    ///
    /// Each call starts over from the current cursor. Concatenating the
    /// yielded spans gives exactly the unread bytes in order.
    pub fn spans(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.buffers.iter()
    }

    /// Copies the unread bytes into one contiguous buffer without draining.
    pub fn to_bytes(&self) -> Bytes {
        match self.buffers.len() {
            0 => Bytes::new(),
            1 => self.buffers[0].clone(),
            _ => util::gather(self.buffers.iter().map(|b| b.as_ref()), self.remaining()),
        }
    }

    /// Computes the CRC64 of the unread bytes.
    pub fn compute_crc64(&self) -> u64 {
        self.spans().fold(0, |crc, span| crc64::compute(span, crc))
    }

    /// Returns the CRC64 recorded when the block was sealed, if computed.
    ///
    /// This covers the whole block regardless of how much was drained since.
    pub fn crc64(&self) -> Option<u64> {
        self.crc64
    }

    /// Returns the total number of bytes appended.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many more bytes may be appended.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.length
    }

    /// Returns the number of appended bytes not yet drained.
    pub fn remaining(&self) -> usize {
        self.length - self.drained
    }

    /// Returns true once the block no longer accepts appends.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns the block index within its staged stream.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the stream offset of the block's first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the block's byte range within the stream.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.length as u64
    }

    /// Stops accepting appends, recording the checksum if asked to.
    pub(crate) fn seal(&mut self, checksum: bool) {
        self.sealed = true;
        if checksum {
            self.crc64 = Some(self.compute_crc64());
        }
    }

    fn advance_cursor(&mut self, mut cnt: usize) {
        self.drained += cnt;
        while cnt > 0 {
            let Some(front) = self.buffers.front_mut() else {
                break;
            };
            let take = cnt.min(front.len());
            front.advance(take);
            if front.is_empty() {
                self.buffers.pop_front();
            }
            cnt -= take;
        }
    }
}

impl Buf for BufferAggregator {
    fn remaining(&self) -> usize {
        self.length - self.drained
    }

    fn chunk(&self) -> &[u8] {
        self.buffers.front().map(|b| b.as_ref()).unwrap_or(&[])
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.length - self.drained,
            "cannot advance past remaining: {} > {}",
            cnt,
            self.length - self.drained
        );
        self.advance_cursor(cnt);
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        assert!(
            len <= self.length - self.drained,
            "cannot copy past remaining: {} > {}",
            len,
            self.length - self.drained
        );
        self.get_first_n_bytes(len)
    }
}

impl fmt::Display for BufferAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block #{} ({} bytes @ {}",
            self.index, self.length, self.offset
        )?;
        if let Some(crc) = self.crc64 {
            write!(f, ", crc64={:016x}", crc)?;
        }
        write!(f, ")")
    }
}
