//! Encoding of version counters stored in the version column.
//!
//! Versions are signed 64-bit integers stored big-endian, so that stored
//! values compare bytewise in numeric order for non-negative versions.

/// Encodes a version as 8 big-endian bytes.
pub fn encode_version(version: i64) -> Vec<u8> {
    version.to_be_bytes().to_vec()
}

/// Decodes a version previously written with [`encode_version`].
///
/// Returns `None` when the value is not exactly 8 bytes long.
pub fn decode_version(bytes: &[u8]) -> Option<i64> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some(i64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_big_endian() {
        assert_eq!(encode_version(1), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_version(258), vec![0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_decode_encoded_version() {
        assert_eq!(decode_version(&encode_version(42)), Some(42));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode_version(b"1"), None);
        assert_eq!(decode_version(&[0u8; 9]), None);
    }

    #[test]
    fn test_encoded_versions_sort_numerically() {
        assert!(encode_version(9) < encode_version(10));
        assert!(encode_version(255) < encode_version(256));
    }
}
