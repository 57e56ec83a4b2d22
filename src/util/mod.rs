//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use bytes::{Bytes, BytesMut};

/// Copies a run of spans into one contiguous `Bytes`.
///
/// Used when requested bytes straddle more than one appended buffer and a
/// zero-copy slice is not possible.
pub(crate) fn gather<'a>(spans: impl IntoIterator<Item = &'a [u8]>, len: usize) -> Bytes {
    let mut combined = BytesMut::with_capacity(len);
    for span in spans {
        let take = span.len().min(len - combined.len());
        combined.extend_from_slice(&span[..take]);
        if combined.len() == len {
            break;
        }
    }
    combined.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_truncates() {
        let spans: [&[u8]; 3] = [b"abc", b"def", b"ghi"];
        assert_eq!(gather(spans, 5), Bytes::from_static(b"abcde"));
        assert_eq!(gather(spans, 9), Bytes::from_static(b"abcdefghi"));
        assert_eq!(gather(spans, 0), Bytes::new());
    }
}
