//! Encrypted files: per-path seed folding, key and tweak derivation, size
//! padding, and the padded AEAD envelope.
//!
//! Envelope layout:
//! ```text
//! [nonce:24][metadata:16 = version byte + 15 zeros][ciphertext + 16-byte tag]
//! ```
//! The plaintext is zero-padded before encryption so that the total envelope
//! lands exactly on a progressive padding boundary; file sizes therefore leak
//! only coarse size classes.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use skydb_core::error::{hex_to_bytes, validate_byte_len, validate_hex_string};
use skydb_core::{SkyError, SkyResult};

use crate::seed::sha512;
use crate::{
    ENCRYPTED_JSON_RESPONSE_VERSION, ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH,
    ENCRYPTION_KEY_LENGTH, ENCRYPTION_NONCE_LENGTH, ENCRYPTION_OVERHEAD_LENGTH,
    ENCRYPTION_PATH_SEED_LENGTH, SALT_ENCRYPTED_CHILD, SALT_ENCRYPTED_TWEAK, SALT_ENCRYPTION,
};

/// Fixed envelope overhead: AEAD tag, nonce, and the metadata field.
const TOTAL_OVERHEAD: usize =
    ENCRYPTION_OVERHEAD_LENGTH + ENCRYPTION_NONCE_LENGTH + ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH;

/// Largest padding exponent; beyond this the schedule overflows.
const MAX_PADDING_EXPONENT: u32 = 53;

/// Plaintext metadata stored alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedFileMetadata {
    version: u8,
}

impl EncryptedFileMetadata {
    /// Range-checked constructor: the version must fit a single byte.
    pub fn new(version: i64) -> SkyResult<Self> {
        let version = u8::try_from(version).map_err(|_| {
            SkyError::Format(format!(
                "Metadata version '{version}' could not be stored in a uint8"
            ))
        })?;
        Ok(EncryptedFileMetadata { version })
    }

    pub fn current() -> Self {
        EncryptedFileMetadata {
            version: ENCRYPTED_JSON_RESPONSE_VERSION,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }
}

/// Encode metadata into its fixed 16-byte field.
pub fn encode_encrypted_file_metadata(
    metadata: &EncryptedFileMetadata,
) -> [u8; ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH] {
    let mut bytes = [0u8; ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH];
    bytes[0] = metadata.version;
    bytes
}

/// Decode the 16-byte metadata field.
pub fn decode_encrypted_file_metadata(bytes: &[u8]) -> SkyResult<EncryptedFileMetadata> {
    validate_byte_len(
        "bytes",
        bytes,
        "encrypted file metadata bytes",
        ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH,
    )?;
    Ok(EncryptedFileMetadata { version: bytes[0] })
}

/// Normalize a sub-path: no leading slash, no trailing or doubled slashes,
/// lowercased first segment. Returns `None` for paths with no content.
pub fn sanitize_path(path: &str) -> Option<String> {
    let path = path.trim();
    if path.starts_with('/') {
        return None;
    }
    let path = path.trim_end_matches('/');

    let mut collapsed = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' && prev_slash {
            continue;
        }
        prev_slash = ch == '/';
        collapsed.push(ch);
    }

    if collapsed.is_empty() {
        return None;
    }

    let mut segments: Vec<&str> = collapsed.split('/').collect();
    let first_lower = segments[0].to_lowercase();
    segments[0] = &first_lower;
    Some(segments.join("/"))
}

/// Fold a path seed down a sub-path.
///
/// Each segment derives
/// `SHA-512(SHA-512(salt_child) ++ SHA-512(seed ++ dir_flag ++ name))[..32]`;
/// every segment except the last is a directory, the last one per
/// `is_directory`.
pub fn derive_encrypted_file_seed(
    path_seed: &str,
    sub_path: &str,
    is_directory: bool,
) -> SkyResult<String> {
    validate_hex_string("pathSeed", path_seed, "parameter")?;
    let mut seed_bytes = hex_to_bytes("pathSeed", path_seed, "parameter")?;

    let sanitized = sanitize_path(sub_path).ok_or_else(|| {
        SkyError::Format(format!("Input subPath '{sub_path}' not a valid path"))
    })?;

    let names: Vec<&str> = sanitized.split('/').collect();
    let last = names.len() - 1;
    for (index, name) in names.iter().enumerate() {
        let directory = if index == last { is_directory } else { true };

        let mut derivation_input = Vec::with_capacity(seed_bytes.len() + 1 + name.len());
        derivation_input.extend_from_slice(&seed_bytes);
        derivation_input.push(if directory { b'1' } else { b'0' });
        derivation_input.extend_from_slice(name.as_bytes());
        let derivation_path = sha512(&derivation_input);

        let mut data = Vec::with_capacity(128);
        data.extend_from_slice(&sha512(SALT_ENCRYPTED_CHILD.as_bytes()));
        data.extend_from_slice(&derivation_path);
        seed_bytes = sha512(&data)[..ENCRYPTION_PATH_SEED_LENGTH].to_vec();

        derivation_input.zeroize();
        data.zeroize();
    }

    Ok(hex::encode(&seed_bytes))
}

/// The encryption key entropy for a path seed. The hash runs over the hex
/// string's bytes, not the decoded seed.
pub fn derive_encrypted_file_key_entropy(path_seed: &str) -> [u8; ENCRYPTION_KEY_LENGTH] {
    salted_path_seed_hash(SALT_ENCRYPTION, path_seed)
}

/// The hex registry tweak for an encrypted file's path seed.
pub fn derive_encrypted_file_tweak(path_seed: &str) -> String {
    hex::encode(salted_path_seed_hash(SALT_ENCRYPTED_TWEAK, path_seed))
}

fn salted_path_seed_hash(salt: &str, path_seed: &str) -> [u8; 32] {
    let mut data = Vec::with_capacity(128);
    data.extend_from_slice(&sha512(salt.as_bytes()));
    data.extend_from_slice(&sha512(path_seed.as_bytes()));
    let hash = sha512(&data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash[..32]);
    out
}

/// Round a size up to the next boundary of the progressive schedule: sizes
/// up to `80 * 2^n` KiB pad to multiples of `4 * 2^n` KiB.
pub fn pad_file_size(initial_size: u64) -> SkyResult<u64> {
    let kib: u128 = 1 << 10;
    let initial = initial_size as u128;

    for n in 0..MAX_PADDING_EXPONENT {
        if initial <= (1u128 << n) * 80 * kib {
            let padding_block = (1u128 << n) * 4 * kib;
            let mut final_size = initial;
            if final_size % padding_block != 0 {
                final_size = initial - (initial % padding_block) + padding_block;
            }
            return Ok(final_size as u64);
        }
    }
    Err(SkyError::PaddingOverflow)
}

/// Whether a size sits exactly on a boundary of the padding schedule.
pub fn check_padded_block(size: u64) -> SkyResult<bool> {
    let kib: u128 = 1 << 10;
    let size = size as u128;

    for n in 0..MAX_PADDING_EXPONENT {
        if size <= (1u128 << n) * 80 * kib {
            let padding_block = (1u128 << n) * 4 * kib;
            return Ok(size % padding_block == 0);
        }
    }
    Err(SkyError::PaddingOverflow)
}

/// Encrypt a JSON value into a padded envelope.
pub fn encrypt_json_file(
    json: &serde_json::Value,
    metadata: &EncryptedFileMetadata,
    key: &[u8],
) -> SkyResult<Vec<u8>> {
    validate_byte_len("key", key, "parameter", ENCRYPTION_KEY_LENGTH)?;

    let data = serde_json::to_vec(json)
        .map_err(|e| anyhow::anyhow!("could not serialize JSON payload: {e}"))?;

    let final_size = pad_file_size((data.len() + TOTAL_OVERHEAD) as u64)? as usize - TOTAL_OVERHEAD;
    let mut padded = data;
    padded.resize(final_size, 0);

    let mut nonce_bytes = [0u8; ENCRYPTION_NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let mut key_bytes = [0u8; ENCRYPTION_KEY_LENGTH];
    key_bytes.copy_from_slice(key);
    let cipher = XChaCha20Poly1305::new((&key_bytes).into());
    key_bytes.zeroize();
    let ciphertext = cipher
        .encrypt(nonce, padded.as_slice())
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;
    padded.zeroize();

    let mut envelope =
        Vec::with_capacity(ENCRYPTION_NONCE_LENGTH + ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&encode_encrypted_file_metadata(metadata));
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Decrypt a padded envelope back into its JSON value.
pub fn decrypt_json_file(data: &[u8], key: &[u8]) -> SkyResult<serde_json::Value> {
    validate_byte_len("key", key, "parameter", ENCRYPTION_KEY_LENGTH)?;

    if !check_padded_block(data.len() as u64)? {
        let padded_size = pad_file_size(data.len() as u64)?;
        return Err(SkyError::Format(format!(
            "Expected parameter 'data' to be padded encrypted data, length was '{}', nearest padded block is '{padded_size}'",
            data.len()
        )));
    }

    let (nonce_bytes, rest) = data.split_at(ENCRYPTION_NONCE_LENGTH);
    let (metadata_bytes, ciphertext) = rest.split_at(ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH);

    let metadata = decode_encrypted_file_metadata(metadata_bytes)?;
    if metadata.version() != ENCRYPTED_JSON_RESPONSE_VERSION {
        return Err(SkyError::Format(format!(
            "Received unrecognized JSON response version '{}' in metadata, expected '{}'",
            metadata.version(),
            ENCRYPTED_JSON_RESPONSE_VERSION
        )));
    }

    let mut key_bytes = [0u8; ENCRYPTION_KEY_LENGTH];
    key_bytes.copy_from_slice(key);
    let cipher = XChaCha20Poly1305::new((&key_bytes).into());
    key_bytes.zeroize();
    let mut plaintext = cipher
        .decrypt(XNonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| SkyError::Format("Could not decrypt given encrypted JSON file".to_string()))?;

    let mut end = plaintext.len();
    while end > 0 && plaintext[end - 1] == 0 {
        end -= 1;
    }
    let value = serde_json::from_slice(&plaintext[..end])
        .map_err(|e| anyhow::anyhow!("decrypted payload is not valid JSON: {e}"))?;
    plaintext.zeroize();
    Ok(value)
}
