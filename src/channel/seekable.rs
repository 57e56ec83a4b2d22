//! Seekable, window-buffered byte channel over injected behaviors.
//!
//! A channel is opened for reading or for writing, never both, and holds
//! one in-memory window of `buffer_len` bytes:
//!
//! - Read mode: the window is the aligned chunk containing the position
//!   (`position - position % buffer_len`), faulted in with one behavior
//!   call and reused until the position leaves it.
//! - Write mode: the window starts where writing started and is flushed
//!   when it fills, when a seek leaves it, or on close.

use tracing::{debug, trace};

use super::{ReadBehavior, WriteBehavior};
use crate::config::ChannelConfig;
use crate::error::ChannelError;

type BoxedRead<'a> = Box<dyn ReadBehavior + Send + 'a>;
type BoxedWrite<'a> = Box<dyn WriteBehavior + Send + 'a>;

struct ReadState<'a> {
    behavior: BoxedRead<'a>,
    position: u64,
    /// Start of the loaded chunk, `None` until something is faulted in.
    window: Option<u64>,
    filled: usize,
}

struct WriteState<'a> {
    behavior: BoxedWrite<'a>,
    window_start: u64,
    cursor: usize,
    /// Bytes `[0, dirty)` of the window are unflushed writes.
    dirty: usize,
}

impl WriteState<'_> {
    fn position(&self) -> u64 {
        self.window_start + self.cursor as u64
    }

    /// Writes the dirty part of the window out. Leaves everything untouched
    /// on failure.
    fn flush(&mut self, buffer: &[u8], high_water: &mut u64) -> Result<(), ChannelError> {
        if self.dirty == 0 {
            return Ok(());
        }

        self.behavior.write(&buffer[..self.dirty], self.window_start)?;
        debug!(
            offset = self.window_start,
            len = self.dirty,
            "flushed write window"
        );

        *high_water = (*high_water).max(self.window_start + self.dirty as u64);
        self.window_start += self.cursor as u64;
        self.cursor = 0;
        self.dirty = 0;
        Ok(())
    }
}

/// Rejects write positions whose window would run past `u64::MAX`.
fn check_window_fits(position: u64, buffer_len: usize) -> Result<(), ChannelError> {
    match position.checked_add(buffer_len as u64) {
        Some(_) => Ok(()),
        None => Err(ChannelError::UnsupportedSeek {
            position,
            reason: format!("a {}-byte window at this position overflows u64", buffer_len),
        }),
    }
}

enum Mode<'a> {
    Read(ReadState<'a>),
    Write(WriteState<'a>),
}

/// A random-access byte channel over a remote or virtual resource.
///
/// All I/O goes through the injected [`ReadBehavior`] or [`WriteBehavior`];
/// the channel is transport-agnostic. Errors from behaviors are returned
/// unchanged inside [`ChannelError::Io`] and never retried here.
///
/// # Write offsets
///
/// Write windows are anchored at the starting position or the last seek
/// that left the window, not aligned to `buffer_len`. A [`WriteBehavior`]
/// therefore receives writes at whatever offsets it accepted in
/// [`assert_can_seek`](WriteBehavior::assert_can_seek), plus whole windows
/// after them. A write-mode position must leave room for one full window
/// below `u64::MAX`.
///
/// # Retrying writes
///
/// A [`write`](Self::write) that fills the window flushes it. If that flush
/// fails the write is undone: position, buffered bytes and dirty extent are
/// exactly as before the call, so the caller can repeat the same write.
///
/// # Threading
///
/// Not safe for concurrent use; every method takes `&mut self`.
///
/// # Example
///
/// ```
/// use blockstage::{ChannelConfig, MemoryResource, SeekableByteChannel};
///
/// let resource = MemoryResource::from_bytes(b"0123456789".to_vec());
/// let mut channel = SeekableByteChannel::for_read(ChannelConfig::new(4)?, resource)?;
///
/// channel.set_position(6)?;
/// let mut buf = [0u8; 8];
/// assert_eq!(channel.read(&mut buf)?, Some(2));
/// assert_eq!(&buf[..2], b"67");
/// # Ok::<(), blockstage::ChannelError>(())
/// ```
pub struct SeekableByteChannel<'a> {
    buffer: Vec<u8>,
    high_water: u64,
    open: bool,
    mode: Mode<'a>,
}

impl<'a> SeekableByteChannel<'a> {
    /// Opens a read-only channel.
    pub fn for_read(
        config: ChannelConfig,
        behavior: impl ReadBehavior + Send + 'a,
    ) -> Result<Self, ChannelError> {
        config.validate()?;

        Ok(Self {
            buffer: vec![0u8; config.buffer_len()],
            high_water: 0,
            open: true,
            mode: Mode::Read(ReadState {
                behavior: Box::new(behavior),
                position: config.starting_position(),
                window: None,
                filled: 0,
            }),
        })
    }

    /// Opens a write-only channel.
    ///
    /// A non-zero starting position must pass the behavior's seek check.
    pub fn for_write(
        config: ChannelConfig,
        behavior: impl WriteBehavior + Send + 'a,
    ) -> Result<Self, ChannelError> {
        config.validate()?;

        let position = config.starting_position();
        check_window_fits(position, config.buffer_len())?;
        if position != 0 {
            behavior
                .assert_can_seek(position)
                .map_err(|rejected| ChannelError::UnsupportedSeek {
                    position,
                    reason: rejected.reason,
                })?;
        }

        Ok(Self {
            buffer: vec![0u8; config.buffer_len()],
            high_water: 0,
            open: true,
            mode: Mode::Write(WriteState {
                behavior: Box::new(behavior),
                window_start: position,
                cursor: 0,
                dirty: 0,
            }),
        })
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.open {
            Ok(())
        } else {
            Err(ChannelError::ChannelClosed)
        }
    }

    /// Reads into `dst` from the current position.
    ///
    /// Returns `Some(n)` with the bytes copied, at most what is left in the
    /// current window, or `None` at the end of the resource.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>, ChannelError> {
        self.ensure_open()?;

        let Self {
            buffer,
            high_water,
            mode,
            ..
        } = self;
        let Mode::Read(state) = mode else {
            return Err(ChannelError::NonReadableChannel);
        };

        let known_len = state.behavior.resource_length();
        if known_len.is_some_and(|len| state.position >= len) {
            return Ok(None);
        }
        if dst.is_empty() {
            return Ok(Some(0));
        }

        let buffer_len = buffer.len() as u64;
        let chunk_start = state.position - state.position % buffer_len;
        if state.window != Some(chunk_start) {
            state.window = None;
            state.filled = 0;

            let n = state.behavior.read(buffer, chunk_start)?;
            trace!(offset = chunk_start, len = n, "faulted in read window");

            state.window = Some(chunk_start);
            state.filled = n.min(buffer.len());
        }

        let in_window = (state.position - chunk_start) as usize;
        while in_window >= state.filled && state.filled < buffer.len() {
            let window_end = chunk_start + state.filled as u64;
            if known_len.is_some_and(|len| window_end >= len) {
                break;
            }

            let n = state.behavior.read(&mut buffer[state.filled..], window_end)?;
            if n == 0 {
                break;
            }
            trace!(offset = window_end, len = n, "topped up read window");
            state.filled = (state.filled + n).min(buffer.len());
        }

        *high_water = (*high_water).max(chunk_start + state.filled as u64);
        if in_window >= state.filled {
            return Ok(None);
        }

        let n = dst.len().min(state.filled - in_window);
        dst[..n].copy_from_slice(&buffer[in_window..in_window + n]);
        state.position += n as u64;
        Ok(Some(n))
    }

    /// Writes from `src` at the current position.
    ///
    /// Copies at most what fits in the current window and returns that
    /// count. Nothing reaches the behavior until the window fills, a seek
    /// leaves it, or the channel is flushed or closed.
    pub fn write(&mut self, src: &[u8]) -> Result<usize, ChannelError> {
        self.ensure_open()?;

        let Self {
            buffer,
            high_water,
            mode,
            ..
        } = self;
        let Mode::Write(state) = mode else {
            return Err(ChannelError::NonWritableChannel);
        };

        let addressable = usize::try_from(u64::MAX - state.position()).unwrap_or(usize::MAX);
        let n = src.len().min(buffer.len() - state.cursor).min(addressable);
        if n == 0 {
            return Ok(0);
        }

        let (prev_cursor, prev_dirty) = (state.cursor, state.dirty);
        let overlap_end = prev_dirty.min(prev_cursor + n);
        let overwritten = (overlap_end > prev_cursor).then(|| buffer[prev_cursor..overlap_end].to_vec());

        buffer[prev_cursor..prev_cursor + n].copy_from_slice(&src[..n]);
        state.cursor += n;
        state.dirty = state.dirty.max(state.cursor);

        if state.cursor == buffer.len() {
            if let Err(e) = state.flush(buffer, high_water) {
                if let Some(old) = overwritten {
                    buffer[prev_cursor..overlap_end].copy_from_slice(&old);
                }
                state.cursor = prev_cursor;
                state.dirty = prev_dirty;
                return Err(e);
            }
        }

        Ok(n)
    }

    /// Pushes buffered writes to the behavior without closing.
    pub fn flush_buffer(&mut self) -> Result<(), ChannelError> {
        self.ensure_open()?;

        let Self {
            buffer,
            high_water,
            mode,
            ..
        } = self;
        match mode {
            Mode::Write(state) => state.flush(buffer, high_water),
            Mode::Read(_) => Err(ChannelError::NonWritableChannel),
        }
    }

    /// Returns the current position.
    pub fn position(&self) -> u64 {
        match &self.mode {
            Mode::Read(state) => state.position,
            Mode::Write(state) => state.position(),
        }
    }

    /// Moves to `position`.
    ///
    /// In write mode the behavior may reject the position first, leaving
    /// the channel unchanged. Moving inside the current window does no
    /// I/O. Leaving it flushes pending writes (write mode) or drops the
    /// loaded chunk (read mode).
    pub fn set_position(&mut self, position: u64) -> Result<(), ChannelError> {
        self.ensure_open()?;

        let Self {
            buffer,
            high_water,
            mode,
            ..
        } = self;
        match mode {
            Mode::Read(state) => {
                if let Some(start) = state.window {
                    let end = start.saturating_add(buffer.len() as u64);
                    if position < start || position >= end {
                        state.window = None;
                        state.filled = 0;
                    }
                }
                state.position = position;
            }
            Mode::Write(state) => {
                check_window_fits(position, buffer.len())?;
                if let Err(rejected) = state.behavior.assert_can_seek(position) {
                    debug!(position, reason = %rejected, "seek rejected");
                    return Err(ChannelError::UnsupportedSeek {
                        position,
                        reason: rejected.reason,
                    });
                }

                let start = state.window_start;
                if position >= start && position <= start + state.dirty as u64 {
                    state.cursor = (position - start) as usize;
                } else {
                    state.flush(buffer, high_water)?;
                    state.window_start = position;
                    state.cursor = 0;
                }
            }
        }
        Ok(())
    }

    /// Returns the resource size as far as this channel knows it.
    ///
    /// The larger of the behavior-reported length and the furthest byte
    /// read, written or buffered through this channel.
    pub fn size(&self) -> u64 {
        match &self.mode {
            Mode::Read(state) => state
                .behavior
                .resource_length()
                .unwrap_or(0)
                .max(self.high_water),
            Mode::Write(state) => state
                .behavior
                .resource_length()
                .unwrap_or(0)
                .max(self.high_water)
                .max(state.window_start + state.dirty as u64),
        }
    }

    /// Returns the window length.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true until [`close`](Self::close) succeeds.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true for channels opened with [`for_read`](Self::for_read).
    pub fn is_readable(&self) -> bool {
        matches!(self.mode, Mode::Read(_))
    }

    /// Returns true for channels opened with [`for_write`](Self::for_write).
    pub fn is_writable(&self) -> bool {
        matches!(self.mode, Mode::Write(_))
    }

    /// Closes the channel.
    ///
    /// In write mode the window is flushed and the behavior asked to
    /// commit the final size. If either fails the channel stays open and
    /// `close` may be called again. Closing a closed channel does nothing.
    pub fn close(&mut self) -> Result<(), ChannelError> {
        if !self.open {
            return Ok(());
        }

        let size = self.size();
        let Self {
            buffer,
            high_water,
            mode,
            ..
        } = self;
        if let Mode::Write(state) = mode {
            state.flush(buffer, high_water)?;
            state.behavior.commit(size)?;
            debug!(size, "committed write channel");
        }

        self.open = false;
        Ok(())
    }
}

impl std::fmt::Debug for SeekableByteChannel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeekableByteChannel")
            .field("mode", &if self.is_readable() { "read" } else { "write" })
            .field("position", &self.position())
            .field("buffer_len", &self.buffer.len())
            .field("open", &self.open)
            .finish()
    }
}
