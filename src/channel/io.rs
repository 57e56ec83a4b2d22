//! `std::io` trait impls so a channel plugs into generic I/O code.

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::SeekableByteChannel;

impl Read for SeekableByteChannel<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(SeekableByteChannel::read(self, buf)?.unwrap_or(0))
    }
}

impl Write for SeekableByteChannel<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(SeekableByteChannel::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.flush_buffer()?)
    }
}

impl Seek for SeekableByteChannel<'_> {
    /// `SeekFrom::End` is relative to [`size`](SeekableByteChannel::size).
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.position().checked_add_signed(delta),
            SeekFrom::End(delta) => self.size().checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            ));
        };

        self.set_position(target)?;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position())
    }
}
