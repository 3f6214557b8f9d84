//! The 34-byte skylink value type and its text transcodings.
//!
//! Raw layout: `[bitfield:1][reserved:1][merkle_root:32]`. The low two bits
//! of the bitfield select the version: `00` is a V1 (direct) link whose root
//! is a Merkle commitment to blob data, `01` is a V2 (resolver) link whose
//! root commits to a registry entry.

use std::fmt;
use std::str::FromStr;

use crate::encoding::{
    decode_skylink_base32, decode_skylink_base64, encode_skylink_base32, encode_skylink_base64,
};
use crate::error::{SkyError, SkyResult};
use crate::{
    BASE32_ENCODED_SKYLINK_SIZE, BASE64_ENCODED_SKYLINK_SIZE, RAW_SKYLINK_SIZE, URI_SKYNET_PREFIX,
};

pub const ERR_SKYLINK_INCORRECT_SIZE: &str = "skylink has incorrect size";

/// An immutable 34-byte skylink. Constructed only through the codec; there is
/// no in-place mutation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Skylink([u8; RAW_SKYLINK_SIZE]);

impl Skylink {
    /// The all-zero skylink. Registry entries whose data equals this value
    /// are treated as deleted.
    pub const EMPTY: Skylink = Skylink([0u8; RAW_SKYLINK_SIZE]);

    /// Build a skylink from a bitfield and Merkle root; the reserved byte is
    /// always zero.
    pub fn new(bitfield: u8, merkle_root: [u8; 32]) -> Self {
        let mut bytes = [0u8; RAW_SKYLINK_SIZE];
        bytes[0] = bitfield;
        bytes[2..].copy_from_slice(&merkle_root);
        Skylink(bytes)
    }

    /// Validate and copy raw skylink bytes. The length must be exactly 34.
    pub fn from_bytes(bytes: &[u8]) -> SkyResult<Self> {
        if bytes.len() != RAW_SKYLINK_SIZE {
            return Err(SkyError::validation(
                "data",
                "skylink byte array",
                format!(
                    "type 'bytes' of length {RAW_SKYLINK_SIZE}, was length {}",
                    bytes.len()
                ),
                format!("type 'bytes', value {}", hex::encode(bytes)),
            ));
        }
        let mut raw = [0u8; RAW_SKYLINK_SIZE];
        raw.copy_from_slice(bytes);
        Ok(Skylink(raw))
    }

    /// Decode skylink text. A `sia://` prefix is stripped; 55 characters are
    /// decoded as base32, 46 as base64, anything else is a size error.
    pub fn decode(text: &str) -> SkyResult<Self> {
        let trimmed = text.strip_prefix(URI_SKYNET_PREFIX).unwrap_or(text);
        let bytes = match trimmed.len() {
            BASE32_ENCODED_SKYLINK_SIZE => decode_skylink_base32(trimmed)?,
            BASE64_ENCODED_SKYLINK_SIZE => decode_skylink_base64(trimmed)?,
            _ => return Err(SkyError::Format(ERR_SKYLINK_INCORRECT_SIZE.to_string())),
        };
        if bytes.len() != RAW_SKYLINK_SIZE {
            return Err(SkyError::Format("failed to load skylink data".to_string()));
        }
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RAW_SKYLINK_SIZE] {
        &self.0
    }

    pub fn bitfield(&self) -> u8 {
        self.0[0]
    }

    pub fn merkle_root(&self) -> &[u8] {
        &self.0[2..]
    }

    /// Direct link: low two bitfield bits are `00`.
    pub fn is_v1(&self) -> bool {
        self.bitfield() & 3 == 0
    }

    /// Resolver link: bitfield is exactly `1`.
    pub fn is_v2(&self) -> bool {
        self.bitfield() == 1
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// 46-character URL-safe base64 form (the canonical text form).
    pub fn to_base64(&self) -> String {
        encode_skylink_base64(&self.0)
    }

    /// 55-character lowercase base32 form (the subdomain form).
    pub fn to_base32(&self) -> String {
        encode_skylink_base32(&self.0)
    }
}

impl fmt::Display for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Skylink({})", self.to_base64())
    }
}

impl FromStr for Skylink {
    type Err = SkyError;

    fn from_str(s: &str) -> SkyResult<Self> {
        Skylink::decode(s)
    }
}

/// Ensure a skylink string carries the `sia://` prefix.
pub fn format_skylink(skylink: &str) -> String {
    if skylink.is_empty() || skylink.starts_with(URI_SKYNET_PREFIX) {
        skylink.to_string()
    } else {
        format!("{URI_SKYNET_PREFIX}{skylink}")
    }
}

/// Transcode a 46-character base64 skylink to its 55-character base32 form.
pub fn convert_base64_to_base32(skylink: &str) -> SkyResult<String> {
    let trimmed = skylink.strip_prefix(URI_SKYNET_PREFIX).unwrap_or(skylink);
    if trimmed.len() != BASE64_ENCODED_SKYLINK_SIZE {
        return Err(SkyError::Format(format!(
            "skylink input length is an invalid size of {}, {} characters expected",
            trimmed.len(),
            BASE64_ENCODED_SKYLINK_SIZE
        )));
    }
    Ok(encode_skylink_base32(&decode_skylink_base64(trimmed)?))
}

/// Transcode a 55-character base32 skylink to its 46-character base64 form.
pub fn convert_base32_to_base64(skylink: &str) -> SkyResult<String> {
    let trimmed = skylink.strip_prefix(URI_SKYNET_PREFIX).unwrap_or(skylink);
    if trimmed.len() != BASE32_ENCODED_SKYLINK_SIZE {
        return Err(SkyError::Format(format!(
            "skylink input length is an invalid size of {}, {} characters expected",
            trimmed.len(),
            BASE32_ENCODED_SKYLINK_SIZE
        )));
    }
    Ok(encode_skylink_base64(&decode_skylink_base32(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE64_LINK: &str = "XABvi7JtJbQSMAcDwnUnmp2FKDPjg8_tTTFP4BwMSxVdEg";
    const BASE32_LINK: &str = "bg06v2tidkir84hg0s1s4t97jaeoaa1jse1svrad657u070c9calq4g";

    #[test]
    fn decode_base64_form() {
        let link = Skylink::decode(BASE64_LINK).unwrap();
        assert_eq!(link.to_base64(), BASE64_LINK);
        assert!(link.is_v1());
        assert!(!link.is_v2());
    }

    #[test]
    fn decode_strips_uri_prefix() {
        let with_prefix = format!("sia://{BASE64_LINK}");
        assert_eq!(
            Skylink::decode(&with_prefix).unwrap(),
            Skylink::decode(BASE64_LINK).unwrap()
        );
    }

    #[test]
    fn base64_and_base32_forms_agree() {
        assert_eq!(convert_base64_to_base32(BASE64_LINK).unwrap(), BASE32_LINK);
        assert_eq!(convert_base32_to_base64(BASE32_LINK).unwrap(), BASE64_LINK);

        let link = Skylink::decode(BASE32_LINK).unwrap();
        assert_eq!(link.to_base64(), BASE64_LINK);
    }

    #[test]
    fn wrong_length_is_a_size_error() {
        let err = Skylink::decode("abc").unwrap_err();
        assert_eq!(err.to_string(), ERR_SKYLINK_INCORRECT_SIZE);
    }

    #[test]
    fn from_bytes_requires_exactly_34() {
        assert!(Skylink::from_bytes(&[0u8; 33]).is_err());
        assert!(Skylink::from_bytes(&[0u8; 35]).is_err());
        assert!(Skylink::from_bytes(&[0u8; 34]).is_ok());
    }

    #[test]
    fn empty_sentinel_compares_by_value() {
        let zero = Skylink::from_bytes(&[0u8; 34]).unwrap();
        assert!(zero.is_empty());
        assert_eq!(zero, Skylink::EMPTY);

        let mut bytes = [0u8; 34];
        bytes[33] = 1;
        assert!(!Skylink::from_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn format_skylink_adds_prefix_once() {
        assert_eq!(format_skylink("abc"), "sia://abc");
        assert_eq!(format_skylink("sia://abc"), "sia://abc");
        assert_eq!(format_skylink(""), "");
    }

    #[test]
    fn version_detection_uses_low_two_bits() {
        let v2 = Skylink::new(1, [0u8; 32]);
        assert!(v2.is_v2());
        assert!(!v2.is_v1());

        let v1 = Skylink::new(4, [0u8; 32]); // low bits 00
        assert!(v1.is_v1());
    }

    proptest! {
        #[test]
        fn text_roundtrip_both_encodings(bytes in proptest::collection::vec(any::<u8>(), 34)) {
            let link = Skylink::from_bytes(&bytes).unwrap();
            prop_assert_eq!(Skylink::decode(&link.to_base64()).unwrap(), link);
            prop_assert_eq!(Skylink::decode(&link.to_base32()).unwrap(), link);
        }
    }
}
