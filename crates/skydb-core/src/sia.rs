//! Sia consensus-layer types: algorithm specifiers and public keys in their
//! canonical marshaled form.

use std::fmt;

use crate::encoding::encode_prefixed_bytes;
use crate::error::{hex_to_bytes, validate_byte_len, SkyError, SkyResult};
use crate::{ED25519_PREFIX, PUBLIC_KEY_SIZE, SPECIFIER_LEN};

/// A 16-byte algorithm specifier: the ASCII name, zero-padded on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specifier([u8; SPECIFIER_LEN]);

impl Specifier {
    pub const ED25519: Specifier = Specifier::from_name(b"ed25519");

    /// Build a specifier from an ASCII name. Names longer than 16 bytes are
    /// truncated, matching the fixed-size buffer write of the wire format.
    pub const fn from_name(name: &[u8]) -> Self {
        let mut bytes = [0u8; SPECIFIER_LEN];
        let mut i = 0;
        while i < name.len() && i < SPECIFIER_LEN {
            bytes[i] = name[i];
            i += 1;
        }
        Specifier(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SPECIFIER_LEN] {
        &self.0
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(SPECIFIER_LEN);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

/// A Sia public key: algorithm specifier plus raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiaPublicKey {
    pub algorithm: Specifier,
    pub key: [u8; PUBLIC_KEY_SIZE],
}

impl SiaPublicKey {
    /// Build an ed25519 Sia public key from a hex string. An `ed25519:`
    /// prefix is accepted and stripped.
    pub fn new_ed25519(public_key_hex: &str) -> SkyResult<Self> {
        let hex = public_key_hex
            .strip_prefix(ED25519_PREFIX)
            .unwrap_or(public_key_hex);
        let bytes = hex_to_bytes("publicKey", hex, "parameter")?;
        validate_byte_len("publicKey", &bytes, "parameter", PUBLIC_KEY_SIZE)?;
        let mut key = [0u8; PUBLIC_KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(SiaPublicKey {
            algorithm: Specifier::ED25519,
            key,
        })
    }

    pub fn from_bytes(key: [u8; PUBLIC_KEY_SIZE]) -> Self {
        SiaPublicKey {
            algorithm: Specifier::ED25519,
            key,
        }
    }

    /// The canonical Sia marshaling: 16 specifier bytes, then the key as a
    /// length-prefixed byte string. 56 bytes total for ed25519.
    pub fn marshal_sia(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SPECIFIER_LEN + 8 + PUBLIC_KEY_SIZE);
        out.extend_from_slice(self.algorithm.as_bytes());
        out.extend_from_slice(&encode_prefixed_bytes(&self.key));
        out
    }
}

/// Check a public key string: optional `ed25519:` prefix, then 64 hex chars.
pub fn validate_public_key(name: &str, public_key: &str, kind: &str) -> SkyResult<()> {
    let hex = public_key
        .strip_prefix(ED25519_PREFIX)
        .unwrap_or(public_key);
    if hex.len() != PUBLIC_KEY_SIZE * 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SkyError::validation(
            name,
            kind,
            "a hex-encoded string with a valid prefix",
            format!("type 'string', value {public_key}"),
        ));
    }
    Ok(())
}
