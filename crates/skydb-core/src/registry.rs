//! Registry entry value types and the wire shape of registry proofs.

use serde::Deserialize;

use crate::error::{SkyError, SkyResult};
use crate::{MAX_ENTRY_LENGTH, SIGNATURE_LENGTH};

/// A registry entry: a keyed, versioned blob of at most 70 bytes.
///
/// `data_key` is kept as the caller supplied it; whether it is a plain name
/// or an already-hashed hex tweak is decided at hashing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub data_key: String,
    pub data: Vec<u8>,
    pub revision: u64,
}

impl RegistryEntry {
    pub fn new(data_key: impl Into<String>, data: Vec<u8>, revision: u64) -> Self {
        RegistryEntry {
            data_key: data_key.into(),
            data,
            revision,
        }
    }
}

/// A registry entry together with the ed25519 signature the portal returned
/// or the client produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRegistryEntry {
    pub entry: RegistryEntry,
    pub signature: [u8; SIGNATURE_LENGTH],
}

/// One hop of a registry proof, as served in the `skynet-proof` header.
///
/// `data` and `signature` are hex, `datakey` is the hashed tweak in hex, and
/// the public key rides inside a nested object with a base64 key.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryProof {
    pub data: String,
    pub revision: u64,
    pub datakey: String,
    pub publickey: RegistryProofPublicKey,
    pub signature: String,
    #[serde(rename = "type")]
    pub entry_type: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryProofPublicKey {
    pub algorithm: String,
    pub key: String,
}

/// Enforce the registry's 70-byte data limit before signing or posting.
pub fn validate_entry_data_len(entry: &RegistryEntry) -> SkyResult<()> {
    if entry.data.len() > MAX_ENTRY_LENGTH {
        return Err(SkyError::validation(
            "entry.data",
            "parameter",
            format!("'bytes' of length at most {MAX_ENTRY_LENGTH}"),
            format!("length {}", entry.data.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_len_limit_is_70() {
        let ok = RegistryEntry::new("key", vec![0u8; 70], 0);
        assert!(validate_entry_data_len(&ok).is_ok());

        let too_big = RegistryEntry::new("key", vec![0u8; 71], 0);
        assert!(validate_entry_data_len(&too_big).is_err());
    }

    #[test]
    fn proof_hop_deserializes_from_header_json() {
        let json = r#"{
            "data": "5c006f8bb26d25b412300703c275279a9d852833e383cfed4d314fe01c0c4b15",
            "revision": 0,
            "datakey": "43c8a9b01609544ab152dad397afc3b56c1518eb546750dbc6cad5944fec0292",
            "publickey": {
                "algorithm": "ed25519",
                "key": "y/l99FyfFm6JPhZL5xSkruhA06Qh9m5S9rnipQCc+rw="
            },
            "signature": "5a14375075fcab5e1b19d7b29628a193ed1a8e63273e8e39be6575808e2d2207",
            "type": 1
        }"#;
        let proof: RegistryProof = serde_json::from_str(json).unwrap();
        assert_eq!(proof.entry_type, 1);
        assert_eq!(proof.publickey.algorithm, "ed25519");
        assert_eq!(proof.revision, 0);
    }
}
