//! Sia binary encoding primitives and the two skylink text encodings.
//!
//! Binary layout rules (all lengths little-endian u64):
//! ```text
//! encode_number(n)          = n as 8 bytes LE
//! encode_prefixed_bytes(b)  = encode_number(len(b)) || b
//! encode_utf8_str(s)        = encode_prefixed_bytes(s as UTF-8)
//! ```
//!
//! Text forms of a 34-byte skylink:
//! - base64: URL-safe alphabet, no padding, exactly 46 characters
//! - base32: alphabet `0-9a-v`, no padding, exactly 55 characters, lowercase

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{SkyError, SkyResult};

/// The non-standard base32 alphabet used for skylink subdomains.
const BASE32_CHARS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Encode a u64 as 8 little-endian bytes.
pub fn encode_number(num: u64) -> [u8; 8] {
    num.to_le_bytes()
}

/// Length-prefix a byte slice: 8-byte LE length followed by the bytes.
pub fn encode_prefixed_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(8 + bytes.len());
    encoded.extend_from_slice(&encode_number(bytes.len() as u64));
    encoded.extend_from_slice(bytes);
    encoded
}

/// Length-prefix a string's UTF-8 bytes.
pub fn encode_utf8_str(s: &str) -> Vec<u8> {
    encode_prefixed_bytes(s.as_bytes())
}

/// Encode bytes as URL-safe base64 without padding.
pub fn encode_skylink_base64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe no-pad base64 skylink text.
pub fn decode_skylink_base64(text: &str) -> SkyResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| SkyError::Format(format!("could not decode base64 skylink '{text}'")))
}

/// Encode bytes in the skylink base32 alphabet, MSB-first, no padding.
///
/// For 34 input bytes the output is 55 symbols; the final symbol carries the
/// last 2 data bits shifted into the high end of its 5-bit group.
pub fn encode_skylink_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut remainder: u32 = 0;
    let mut remainder_bits: u32 = 0;

    for &b in bytes {
        remainder = (remainder << 8) | b as u32;
        remainder_bits += 8;
        while remainder_bits >= 5 {
            remainder_bits -= 5;
            let c = (remainder >> remainder_bits) & 0x1f;
            out.push(BASE32_CHARS[c as usize] as char);
        }
    }
    if remainder_bits > 0 {
        let c = (remainder << (5 - remainder_bits)) & 0x1f;
        out.push(BASE32_CHARS[c as usize] as char);
    }
    out
}

/// Decode skylink base32 text. Case-insensitive; trailing bits that do not
/// fill a byte are discarded, matching the encoder.
pub fn decode_skylink_base32(text: &str) -> SkyResult<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buf: u32 = 0;
    let mut buf_bits: u32 = 0;

    for ch in text.chars() {
        let lower = ch.to_ascii_lowercase();
        let value = BASE32_CHARS
            .iter()
            .position(|&c| c as char == lower)
            .ok_or_else(|| {
                SkyError::Format(format!(
                    "base32 skylink contains unexpected character '{ch}'"
                ))
            })?;
        buf = (buf << 5) | value as u32;
        buf_bits += 5;
        if buf_bits >= 8 {
            buf_bits -= 8;
            out.push(((buf >> buf_bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_number_is_little_endian() {
        assert_eq!(encode_number(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_number(0x0102), [2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn prefixed_bytes_layout() {
        let encoded = encode_prefixed_bytes(b"abc");
        assert_eq!(encoded.len(), 11);
        assert_eq!(&encoded[..8], &[3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&encoded[8..], b"abc");
    }

    #[test]
    fn utf8_str_uses_byte_length() {
        // "π" is 2 bytes in UTF-8
        let encoded = encode_utf8_str("π");
        assert_eq!(encoded[0], 2);
        assert_eq!(encoded.len(), 10);
    }

    #[test]
    fn base64_skylink_is_46_chars() {
        let text = encode_skylink_base64(&[0u8; 34]);
        assert_eq!(text.len(), 46);
        assert_eq!(decode_skylink_base64(&text).unwrap(), vec![0u8; 34]);
    }

    #[test]
    fn base32_skylink_is_55_chars() {
        let text = encode_skylink_base32(&[0u8; 34]);
        assert_eq!(text.len(), 55);
        assert_eq!(decode_skylink_base32(&text).unwrap(), vec![0u8; 34]);
    }

    #[test]
    fn base32_rejects_bad_alphabet() {
        assert!(decode_skylink_base32("wxyz").is_err());
    }

    #[test]
    fn base32_decode_is_case_insensitive() {
        let bytes: Vec<u8> = (0u8..34).collect();
        let lower = encode_skylink_base32(&bytes);
        let upper = lower.to_ascii_uppercase();
        assert_eq!(decode_skylink_base32(&upper).unwrap(), bytes);
    }

    proptest! {
        #[test]
        fn base64_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 34)) {
            let text = encode_skylink_base64(&bytes);
            prop_assert_eq!(text.len(), 46);
            prop_assert_eq!(decode_skylink_base64(&text).unwrap(), bytes);
        }

        #[test]
        fn base32_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 34)) {
            let text = encode_skylink_base32(&bytes);
            prop_assert_eq!(text.len(), 55);
            prop_assert!(text.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
            prop_assert_eq!(decode_skylink_base32(&text).unwrap(), bytes);
        }
    }
}
