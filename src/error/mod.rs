//! Error types for blockstage.
//!
//! Precondition failures (capacity, wrong channel mode, closed channel) are
//! raised locally. I/O failures from injected behaviors are carried unchanged
//! inside the `Io` variants.

use std::io;

use thiserror::Error;

/// Errors raised while staging upload blocks.
#[derive(Debug, Error)]
pub enum StagingError {
    /// An append would push an aggregator past its capacity.
    #[error("capacity exceeded: {attempted} bytes into an aggregator of {capacity}")]
    CapacityExceeded {
        /// Configured capacity of the aggregator.
        capacity: usize,
        /// Total length the append would have produced.
        attempted: usize,
    },

    /// Append attempted on an aggregator that was already sealed.
    #[error("aggregator is sealed")]
    Sealed,

    /// The staging area was already flushed.
    #[error("staging area already flushed")]
    Finished,

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// An I/O error occurred while reading input data.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while combining block checksums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    /// A block index below the highest recorded one has no checksum.
    #[error("missing checksum for block {index}")]
    MissingBlock {
        /// The first absent block index.
        index: usize,
    },

    /// The same block index was recorded twice.
    #[error("duplicate checksum for block {index}")]
    DuplicateBlock {
        /// The repeated block index.
        index: usize,
    },
}

/// A seek refused by a [`WriteBehavior`](crate::WriteBehavior).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SeekRejected {
    /// Why the behavior refused the seek.
    pub reason: String,
}

impl SeekRejected {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the seekable channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Read attempted on a channel opened for writing.
    #[error("channel is not readable")]
    NonReadableChannel,

    /// Write attempted on a channel opened for reading.
    #[error("channel is not writable")]
    NonWritableChannel,

    /// Operation attempted after `close()`.
    #[error("channel is closed")]
    ChannelClosed,

    /// The write behavior refused to seek to `position`.
    #[error("unsupported seek to {position}: {reason}")]
    UnsupportedSeek {
        /// Requested position.
        position: u64,
        /// Reason reported by the behavior.
        reason: String,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// I/O failure reported by a read or write behavior.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<ChannelError> for io::Error {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::Io(e) => e,
            ChannelError::NonReadableChannel | ChannelError::NonWritableChannel => {
                io::Error::new(io::ErrorKind::Unsupported, e)
            }
            ChannelError::ChannelClosed => io::Error::new(io::ErrorKind::BrokenPipe, e),
            ChannelError::UnsupportedSeek { .. } | ChannelError::InvalidConfig { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: StagingError = io_err.into();
        assert!(matches!(err, StagingError::Io(_)));
    }

    #[test]
    fn test_display() {
        let err = StagingError::CapacityExceeded {
            capacity: 50,
            attempted: 100,
        };
        assert!(err.to_string().contains("capacity exceeded"));

        let err = ChannelError::UnsupportedSeek {
            position: 7,
            reason: "must be a multiple of 512".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported seek to 7: must be a multiple of 512"
        );
    }

    #[test]
    fn test_channel_error_into_io_keeps_original() {
        let original = io::Error::new(io::ErrorKind::TimedOut, "range get timed out");
        let err: io::Error = ChannelError::Io(original).into();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "range get timed out");
    }

    #[test]
    fn test_channel_error_into_io_kinds() {
        let err: io::Error = ChannelError::NonWritableChannel.into();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let err: io::Error = ChannelError::ChannelClosed.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
