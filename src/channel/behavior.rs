//! I/O strategies injected into a [`SeekableByteChannel`](super::SeekableByteChannel).
//!
//! The channel only buffers and tracks positions. Every byte that reaches
//! or leaves the backing resource goes through one of these traits, which
//! is where a transport (ranged GET, block or page PUT) plugs in.

use std::io;

use crate::error::SeekRejected;

/// Reads ranges of a resource.
pub trait ReadBehavior {
    /// Reads into `dst` starting at resource `offset`.
    ///
    /// Returns the number of bytes read. `Ok(0)` for a non-empty `dst`
    /// means nothing exists at `offset`. Fewer than `dst.len()` bytes is
    /// allowed anywhere but expected only at the end of the resource.
    fn read(&mut self, dst: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Returns the resource length, or `None` if it is not known.
    fn resource_length(&self) -> Option<u64>;
}

/// Writes ranges of a resource.
pub trait WriteBehavior {
    /// Writes all of `src` at resource `offset`.
    ///
    /// On error the channel keeps the bytes buffered so the same write can
    /// be retried.
    fn write(&mut self, src: &[u8], offset: u64) -> io::Result<()>;

    /// Rejects positions this resource cannot write at.
    ///
    /// Page blobs, for example, only accept 512-byte aligned offsets.
    fn assert_can_seek(&self, position: u64) -> Result<(), SeekRejected> {
        let _ = position;
        Ok(())
    }

    /// Finalizes the resource once the channel is closed.
    fn commit(&mut self, total_len: u64) -> io::Result<()> {
        let _ = total_len;
        Ok(())
    }

    /// Returns the resource length before this channel wrote to it.
    fn resource_length(&self) -> Option<u64> {
        None
    }
}

impl<T: ReadBehavior + ?Sized> ReadBehavior for &mut T {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read(dst, offset)
    }

    fn resource_length(&self) -> Option<u64> {
        (**self).resource_length()
    }
}

impl<T: ReadBehavior + ?Sized> ReadBehavior for Box<T> {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read(dst, offset)
    }

    fn resource_length(&self) -> Option<u64> {
        (**self).resource_length()
    }
}

impl<T: WriteBehavior + ?Sized> WriteBehavior for &mut T {
    fn write(&mut self, src: &[u8], offset: u64) -> io::Result<()> {
        (**self).write(src, offset)
    }

    fn assert_can_seek(&self, position: u64) -> Result<(), SeekRejected> {
        (**self).assert_can_seek(position)
    }

    fn commit(&mut self, total_len: u64) -> io::Result<()> {
        (**self).commit(total_len)
    }

    fn resource_length(&self) -> Option<u64> {
        (**self).resource_length()
    }
}

impl<T: WriteBehavior + ?Sized> WriteBehavior for Box<T> {
    fn write(&mut self, src: &[u8], offset: u64) -> io::Result<()> {
        (**self).write(src, offset)
    }

    fn assert_can_seek(&self, position: u64) -> Result<(), SeekRejected> {
        (**self).assert_can_seek(position)
    }

    fn commit(&mut self, total_len: u64) -> io::Result<()> {
        (**self).commit(total_len)
    }

    fn resource_length(&self) -> Option<u64> {
        (**self).resource_length()
    }
}
