//! An in-memory resource usable as either channel behavior.

use std::io;

use super::{ReadBehavior, WriteBehavior};
use crate::error::SeekRejected;

/// A resource backed by a `Vec<u8>`.
///
/// Useful for staging data locally and for exercising code written against
/// the behavior traits. An optional seek alignment mimics resources such as
/// page blobs that only accept aligned writes.
///
/// # Example
///
/// ```
/// use blockstage::{ChannelConfig, MemoryResource, SeekableByteChannel};
///
/// let mut resource = MemoryResource::new();
/// let mut channel = SeekableByteChannel::for_write(ChannelConfig::new(4)?, &mut resource)?;
/// channel.write(b"abcdef")?;
/// channel.write(b"ef")?;
/// channel.close()?;
/// drop(channel);
///
/// assert_eq!(resource.data(), b"abcdef");
/// # Ok::<(), blockstage::ChannelError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryResource {
    data: Vec<u8>,
    seek_alignment: Option<u64>,
    committed: Option<u64>,
}

impl MemoryResource {
    /// Creates an empty resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resource holding `data`.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Only allow write-mode seeks to multiples of `alignment`.
    pub fn with_seek_alignment(mut self, alignment: u64) -> Self {
        self.seek_alignment = Some(alignment);
        self
    }

    /// Returns the current contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the length passed to the last commit, if any.
    pub fn committed_len(&self) -> Option<u64> {
        self.committed
    }

    /// Consumes the resource and returns its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ReadBehavior for MemoryResource {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = dst.len().min(self.data.len() - start);
        dst[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn resource_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

impl WriteBehavior for MemoryResource {
    fn write(&mut self, src: &[u8], offset: u64) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start + src.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(src);
        Ok(())
    }

    fn assert_can_seek(&self, position: u64) -> Result<(), SeekRejected> {
        match self.seek_alignment {
            Some(alignment) if position % alignment != 0 => Err(SeekRejected::new(format!(
                "position must be a multiple of {}",
                alignment
            ))),
            _ => Ok(()),
        }
    }

    fn commit(&mut self, total_len: u64) -> io::Result<()> {
        self.committed = Some(total_len);
        Ok(())
    }

    fn resource_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}
