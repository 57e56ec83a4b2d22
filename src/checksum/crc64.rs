//! CRC64 as used by the storage service's content CRC64 header.
//!
//! Reflected polynomial `0x9A6C9329AC4BC9B5`, register complemented on entry
//! and exit. With a zero seed this is CRC-64/NVME: the check value for
//! `b"123456789"` is `0xAE8B14860A799888`.

use crc_fast::CrcAlgorithm::Crc64Nvme;

/// Reflected generator polynomial.
pub const POLY: u64 = 0x9A6C_9329_AC4B_C9B5;

/// Computes the CRC64 of `data` continuing from `initial`.
///
/// `compute(b, compute(a, s)) == compute(a ‖ b, s)`, so a running checksum
/// can be fed one span at a time.
///
/// # Example
///
/// ```
/// use blockstage::crc64;
///
/// assert_eq!(crc64::compute(b"", 0), 0);
/// assert_eq!(crc64::compute(b"123456789", 0), 0xAE8B_1486_0A79_9888);
/// ```
pub fn compute(data: &[u8], initial: u64) -> u64 {
    crc_fast::checksum(Crc64Nvme, data) ^ shift(initial, data.len() as u64)
}

/// Advances a register difference across `len` bytes.
///
/// Checksums of equal-length inputs under two seeds differ by exactly
/// `shift(seed_x ^ seed_y, len)`.
fn shift(delta: u64, len: u64) -> u64 {
    if delta == 0 || len == 0 {
        return delta;
    }
    crc_fast::checksum_combine(Crc64Nvme, delta, 0, len)
}

/// Combines two independently computed checksums into the checksum of the
/// concatenated input.
///
/// `crc_a` is the checksum of the `len_a` bytes of A seeded with
/// `initial_a`; `crc_b` likewise for B. The result is the checksum of A ‖ B
/// seeded with `initial_ab`. No data bytes are needed, only lengths.
///
/// # Example
///
/// ```
/// use blockstage::crc64;
///
/// let a = crc64::compute(b"hello ", 0);
/// let b = crc64::compute(b"world", 0);
/// let ab = crc64::concat(0, 0, a, 6, 0, b, 5);
/// assert_eq!(ab, crc64::compute(b"hello world", 0));
/// ```
pub fn concat(
    initial_ab: u64,
    initial_a: u64,
    crc_a: u64,
    len_a: u64,
    initial_b: u64,
    crc_b: u64,
    len_b: u64,
) -> u64 {
    // Re-seed A with initial_ab, then feed that as B's seed.
    let crc_a = crc_a ^ shift(initial_a ^ initial_ab, len_a);
    crc_fast::checksum_combine(Crc64Nvme, crc_a ^ initial_b, crc_b, len_b)
}

/// A streaming CRC64 hasher.
///
/// # Example
///
/// ```
/// use blockstage::{crc64, Crc64};
///
/// let mut hasher = Crc64::new();
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// assert_eq!(hasher.value(), crc64::compute(b"hello world", 0));
/// assert_eq!(hasher.len(), 11);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crc64 {
    initial: u64,
    value: u64,
    len: u64,
}

impl Crc64 {
    /// Creates a hasher seeded with zero.
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    /// Creates a hasher seeded with `initial`.
    pub fn with_initial(initial: u64) -> Self {
        Self {
            initial,
            value: initial,
            len: 0,
        }
    }

    /// Rebuilds a hasher from a checksum already computed elsewhere.
    ///
    /// `value` must be the checksum of `len` bytes seeded with `initial`.
    pub fn from_parts(initial: u64, value: u64, len: u64) -> Self {
        Self {
            initial,
            value,
            len,
        }
    }

    /// Feeds more data.
    pub fn update(&mut self, data: &[u8]) {
        self.value = compute(data, self.value);
        self.len += data.len() as u64;
    }

    /// Appends the input described by `other` as if it had been fed here.
    pub fn combine(&mut self, other: &Crc64) {
        self.value = concat(
            self.initial,
            self.initial,
            self.value,
            self.len,
            other.initial,
            other.value,
            other.len,
        );
        self.len += other.len;
    }

    /// Returns the checksum of everything fed so far.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if no bytes were fed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resets to the original seed.
    pub fn reset(&mut self) {
        self.value = self.initial;
        self.len = 0;
    }
}
