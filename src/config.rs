//! Configuration for staging and channel behavior.
//!
//! - [`StagingConfig`] - Block size, in-flight bound and checksums
//! - [`ChecksumConfig`] - CRC64 computation control
//! - [`ChannelConfig`] - Window length and starting position

use crate::error::{ChannelError, StagingError};

/// Default upload block size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default number of sealed blocks a bounded write may hand out at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Default channel window length (4 MiB).
pub const DEFAULT_BUFFER_LEN: usize = 4 * 1024 * 1024;

/// Configuration for upload block staging.
///
/// `chunk_size` is the exact size of every sealed block except the last.
/// `max_in_flight` bounds how many sealed blocks
/// [`BufferStagingArea::write_bounded`](crate::BufferStagingArea::write_bounded)
/// returns per call and how many the async adapters queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingConfig {
    chunk_size: usize,
    max_in_flight: usize,
    checksum: ChecksumConfig,
}

impl StagingConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if either value is zero.
    pub fn new(chunk_size: usize, max_in_flight: usize) -> Result<Self, StagingError> {
        if chunk_size == 0 {
            return Err(StagingError::InvalidConfig {
                message: "chunk size must be non-zero",
            });
        }

        if max_in_flight == 0 {
            return Err(StagingError::InvalidConfig {
                message: "max in-flight blocks must be non-zero",
            });
        }

        Ok(Self {
            chunk_size,
            max_in_flight,
            checksum: ChecksumConfig::default(),
        })
    }

    /// Sets the block size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the in-flight bound.
    pub fn with_max_in_flight(mut self, count: usize) -> Self {
        self.max_in_flight = count;
        self
    }

    /// Sets the checksum configuration.
    pub fn with_checksum(mut self, config: ChecksumConfig) -> Self {
        self.checksum = config;
        self
    }

    /// Returns the block size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the in-flight bound.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Returns the checksum configuration.
    pub fn checksum(&self) -> &ChecksumConfig {
        &self.checksum
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), StagingError> {
        Self::new(self.chunk_size, self.max_in_flight).map(|_| ())
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            checksum: ChecksumConfig::default(),
        }
    }
}

/// Configuration for block checksums.
///
/// Controls whether a CRC64 is computed for each sealed block and folded
/// into the whole-stream checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksumConfig {
    /// Whether to compute CRC64 checksums.
    pub enabled: bool,
}

impl ChecksumConfig {
    /// Creates a new checksum configuration.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enables checksums.
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Disables checksums.
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration for a [`SeekableByteChannel`](crate::SeekableByteChannel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelConfig {
    buffer_len: usize,
    starting_position: u64,
}

impl ChannelConfig {
    /// Creates a new configuration with the given window length.
    pub fn new(buffer_len: usize) -> Result<Self, ChannelError> {
        if buffer_len == 0 {
            return Err(ChannelError::InvalidConfig {
                message: "buffer length must be non-zero",
            });
        }

        Ok(Self {
            buffer_len,
            starting_position: 0,
        })
    }

    /// Sets the window length.
    pub fn with_buffer_len(mut self, len: usize) -> Self {
        self.buffer_len = len;
        self
    }

    /// Sets the position the channel starts at.
    pub fn with_starting_position(mut self, position: u64) -> Self {
        self.starting_position = position;
        self
    }

    /// Returns the window length.
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Returns the starting position.
    pub fn starting_position(&self) -> u64 {
        self.starting_position
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), ChannelError> {
        Self::new(self.buffer_len).map(|_| ())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
            starting_position: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_config_default() {
        let config = StagingConfig::default();
        assert_eq!(config.chunk_size(), 4 * 1024 * 1024);
        assert_eq!(config.max_in_flight(), 8);
        assert!(config.checksum().enabled);
    }

    #[test]
    fn test_staging_config_new_valid() {
        let config = StagingConfig::new(1024, 2).unwrap();
        assert_eq!(config.chunk_size(), 1024);
        assert_eq!(config.max_in_flight(), 2);
    }

    #[test]
    fn test_staging_config_invalid_zero() {
        assert!(StagingConfig::new(0, 4).is_err());
        assert!(StagingConfig::new(1024, 0).is_err());
    }

    #[test]
    fn test_staging_config_validate() {
        let config = StagingConfig::default().with_chunk_size(0);
        assert!(config.validate().is_err());

        let config = StagingConfig::default().with_max_in_flight(3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_checksum_config() {
        assert!(ChecksumConfig::default().enabled);
        assert!(ChecksumConfig::enabled().enabled);
        assert!(!ChecksumConfig::disabled().enabled);
        assert!(!ChecksumConfig::new(false).enabled);
    }

    #[test]
    fn test_staging_config_with_checksum() {
        let config = StagingConfig::default().with_checksum(ChecksumConfig::disabled());
        assert!(!config.checksum().enabled);
    }

    #[test]
    fn test_channel_config() {
        let config = ChannelConfig::new(512).unwrap().with_starting_position(1024);
        assert_eq!(config.buffer_len(), 512);
        assert_eq!(config.starting_position(), 1024);

        assert!(ChannelConfig::new(0).is_err());
        assert!(ChannelConfig::default().with_buffer_len(0).validate().is_err());
    }
}
