//! Block-wise base62 encoding.
//!
//! Input is split into 32-byte blocks; each block is treated as a big-endian
//! integer and written with the minimum number of base62 characters that can
//! hold any value of that byte length (43 characters for a full block). The
//! character count of a block therefore determines its byte length, which is
//! what lets the decoder reject truncated input.

use crate::CryptoError;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Bytes per encoded block.
pub const BLOCK_BYTES: usize = 32;
/// Characters per encoded full block.
pub const BLOCK_CHARS: usize = 43;

fn digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'Z' => Some(c - b'A' + 10),
        b'a'..=b'z' => Some(c - b'a' + 36),
        _ => None,
    }
}

/// Characters needed to encode `n` bytes.
fn chars_for_bytes(n: usize) -> usize {
    ((n * 8) as f64 / 62f64.log2()).ceil() as usize
}

/// Byte length encoded by `c` characters, if `c` is a valid block length.
fn bytes_for_chars(c: usize) -> Option<usize> {
    let n = (c as f64 * 62f64.log2() / 8.0).floor() as usize;
    (chars_for_bytes(n) == c).then_some(n)
}

fn encode_block(block: &[u8]) -> String {
    let width = chars_for_bytes(block.len());
    let mut number = block.to_vec();
    let mut digits = Vec::with_capacity(width);

    while number.iter().any(|&b| b != 0) {
        let mut rem: u32 = 0;
        for byte in number.iter_mut() {
            let acc = (rem << 8) | *byte as u32;
            *byte = (acc / 62) as u8;
            rem = acc % 62;
        }
        digits.push(ALPHABET[rem as usize]);
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

fn decode_block(chars: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let n = bytes_for_chars(chars.len())
        .ok_or_else(|| CryptoError::Base62(format!("invalid block length {}", chars.len())))?;
    let mut out = vec![0u8; n];

    for &c in chars {
        let d = digit(c)
            .ok_or_else(|| CryptoError::Base62(format!("invalid character {:?}", c as char)))?;
        let mut carry = d as u32;
        for byte in out.iter_mut().rev() {
            let acc = (*byte as u32) * 62 + carry;
            *byte = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err(CryptoError::Base62("block overflow".to_string()));
        }
    }
    Ok(out)
}

/// Encode bytes as block-wise base62.
pub fn encode(data: &[u8]) -> String {
    data.chunks(BLOCK_BYTES).map(encode_block).collect()
}

/// Decode block-wise base62. Whitespace must already be stripped.
pub fn decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::with_capacity(s.len() * BLOCK_BYTES / BLOCK_CHARS + 1);
    for chunk in s.as_bytes().chunks(BLOCK_CHARS) {
        out.extend_from_slice(&decode_block(chunk)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_block_is_43_chars() {
        assert_eq!(encode(&[0xFF; 32]).len(), BLOCK_CHARS);
        assert_eq!(encode(&[0x00; 32]).len(), BLOCK_CHARS);
        assert_eq!(encode(&[0u8; 64]).len(), 2 * BLOCK_CHARS);
    }

    #[test]
    fn small_values() {
        assert_eq!(encode(&[0]), "00");
        assert_eq!(encode(&[61]), "0z");
        assert_eq!(encode(&[62]), "10");
        assert_eq!(decode("10").unwrap(), vec![62]);
    }

    #[test]
    fn impossible_length_rejected() {
        // One character cannot encode any whole number of bytes.
        assert!(decode("A").is_err());
    }

    #[test]
    fn overflow_rejected() {
        // "zz" = 3843 does not fit in one byte.
        assert!(matches!(decode("zz"), Err(CryptoError::Base62(_))));
    }

    #[test]
    fn invalid_character_rejected() {
        assert!(decode("0+").is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(data in proptest::collection::vec(any::<u8>(), 0..200)) {
            prop_assert_eq!(decode(&encode(&data)).unwrap(), data);
        }
    }
}
