//! Unsigned LEB128 varints.
//!
//! Seven payload bits per byte, least significant group first; the top bit of
//! each byte is set when more bytes follow.
//!
//! ```text
//! 1   -> 0x01
//! 300 -> 0xAC 0x02
//! ```

/// Maximum encoded length of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Append the varint encoding of `value` to `out`.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Number of bytes `encode_varint` produces for `value`.
#[must_use]
pub const fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Decode a varint from the start of `bytes`, XOR-ing every byte with `mask`
/// first (`0xFF` for bytes stored inverted in a descending column).
///
/// Returns the value and the number of bytes consumed, or `None` if the input
/// ends before the terminating byte or the value does not fit in a `u64`.
#[must_use]
pub fn decode_varint(bytes: &[u8], mask: u8) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &raw) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        let byte = raw ^ mask;
        let group = u64::from(byte & 0x7F);
        let shift = 7 * i;
        // The tenth byte may only carry the single remaining bit.
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return None;
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        out
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_decode_matches_encode() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let bytes = encode(value);
            assert_eq!(bytes.len(), varint_len(value));
            assert_eq!(decode_varint(&bytes, 0x00), Some((value, bytes.len())));
        }
    }

    #[test]
    fn test_decode_masked() {
        let inverted: Vec<u8> = encode(300).iter().map(|b| !b).collect();
        assert_eq!(decode_varint(&inverted, 0xFF), Some((300, 2)));
    }

    #[test]
    fn test_decode_stops_at_terminator() {
        // Trailing bytes after the varint are not consumed.
        assert_eq!(decode_varint(&[0xAC, 0x02, 0xFF], 0x00), Some((300, 2)));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_varint(&[], 0x00), None);
        assert_eq!(decode_varint(&[0x80], 0x00), None);
    }

    #[test]
    fn test_decode_overflow() {
        let too_long = [0xFF; 11];
        assert_eq!(decode_varint(&too_long, 0x00), None);
    }
}
