//! The protocol's generic hash (BLAKE2b-256) and the canonical registry
//! entry hash built on it.
//!
//! Canonical entry hash input:
//! ```text
//! hash_all(dataKeyBytes, encode_prefixed_bytes(data), encode_number(revision))
//! ```
//! where `dataKeyBytes` is the hashed tweak when the caller already holds it
//! in hex, or `hash_data_key(dataKey)` otherwise. One hash primitive is used
//! for everything: entry hashing, resolver link derivation, and the
//! discoverable tweak — the cross-implementation vectors pin it down.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use skydb_core::encoding::{encode_number, encode_prefixed_bytes, encode_utf8_str};
use skydb_core::error::hex_to_bytes;
use skydb_core::registry::RegistryEntry;
use skydb_core::sia::SiaPublicKey;
use skydb_core::{SkyResult, Skylink};

use crate::HASH_LENGTH;

pub type Blake2b256 = Blake2b<U32>;

/// Hash the concatenation of all inputs with one streaming hasher.
pub fn hash_all(args: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Blake2b256::new();
    for arg in args {
        hasher.update(arg);
    }
    hasher.finalize().into()
}

/// Hash a data key into its registry tweak.
pub fn hash_data_key(data_key: &str) -> [u8; HASH_LENGTH] {
    hash_all(&[&encode_utf8_str(data_key)])
}

/// The canonical hash an entry is signed over.
///
/// With `hashed_data_key_hex` the entry's data key is taken as an
/// already-hashed hex tweak instead of being hashed here.
pub fn hash_registry_entry(
    entry: &RegistryEntry,
    hashed_data_key_hex: bool,
) -> SkyResult<[u8; HASH_LENGTH]> {
    let data_key_bytes = if hashed_data_key_hex {
        hex_to_bytes("entry.dataKey", &entry.data_key, "parameter")?
    } else {
        hash_data_key(&entry.data_key).to_vec()
    };
    Ok(hash_all(&[
        &data_key_bytes,
        &encode_prefixed_bytes(&entry.data),
        &encode_number(entry.revision),
    ]))
}

/// The registry entry ID a resolver skylink commits to.
pub fn derive_registry_entry_id(
    public_key: &SiaPublicKey,
    tweak: &[u8],
) -> [u8; HASH_LENGTH] {
    hash_all(&[&public_key.marshal_sia(), tweak])
}

/// Build a V2 (resolver) skylink for a public key and tweak.
pub fn new_resolver_link(public_key: &SiaPublicKey, tweak: &[u8]) -> Skylink {
    Skylink::new(1, derive_registry_entry_id(public_key, tweak))
}

/// Derive a deterministic child seed from a master seed and an identifier.
pub fn derive_child_seed(master_seed: &str, seed: &str) -> String {
    hex::encode(hash_all(&[
        &encode_utf8_str(master_seed),
        &encode_utf8_str(seed),
    ]))
}
