//! Verification of registry proof chains.
//!
//! A portal resolving a V2 skylink returns the chain of signed registry
//! entries it followed in the `skynet-proof` header. Each hop is re-verified
//! locally: the hop's entry link must equal the link the previous hop
//! resolved to, and the hop's signature must verify over the canonical entry
//! hash. The portal is never trusted with resolution.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use skydb_core::encoding::encode_skylink_base64;
use skydb_core::error::hex_to_bytes;
use skydb_core::parse::trim_uri_prefix;
use skydb_core::registry::{RegistryEntry, RegistryProof};
use skydb_core::sia::SiaPublicKey;
use skydb_core::{
    SkyError, SkyResult, Skylink, PUBLIC_KEY_SIZE, REGISTRY_TYPE_WITHOUT_PUBKEY, SIGNATURE_LENGTH,
    URI_SKYNET_PREFIX,
};
use skydb_crypto::keys::verify_entry_with_key;

use crate::client::entry_link;

/// The outcome of a verified proof chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProof {
    /// The final V1 skylink the chain resolves to (base64, no prefix).
    pub skylink: String,
    /// The first hop's entry link (base64, no prefix).
    pub resolver_skylink: String,
}

/// Expected endpoints for a chain, when the caller already knows both.
#[derive(Debug, Clone)]
pub struct ProofTarget {
    /// The resolver skylink the chain must start from.
    pub resolver_skylink: String,
    /// The data link the chain must end at.
    pub data_link: String,
}

/// Walk and verify a registry proof chain.
///
/// With a `target`, the first hop is pinned to `target.resolver_skylink` and
/// the final skylink to `target.data_link`; without one, the chain only has
/// to be internally consistent and the endpoints are returned to the caller.
pub fn validate_registry_proof(
    proof: &[RegistryProof],
    target: Option<&ProofTarget>,
) -> SkyResult<ResolvedProof> {
    if proof.is_empty() {
        return Err(SkyError::Format(
            "Expected registry proof not to be empty".to_string(),
        ));
    }

    let mut resolver_skylink: Option<String> = None;
    let mut last_skylink = target.map(|t| t.resolver_skylink.clone());

    for hop in proof {
        if hop.entry_type != REGISTRY_TYPE_WITHOUT_PUBKEY {
            return Err(SkyError::Format(format!(
                "Unsupported registry type in proof: '{}'",
                hop.entry_type
            )));
        }

        let public_key = decode_proof_public_key(hop)?;
        let public_key_hex = hex::encode(public_key.key);

        let hop_link = entry_link(&public_key_hex, &hop.datakey, true)?;
        let hop_link = trim_uri_prefix(&hop_link, URI_SKYNET_PREFIX);

        if let Some(expected) = &last_skylink {
            if &hop_link != expected {
                return Err(SkyError::Trust(
                    "Could not verify registry proof chain".to_string(),
                ));
            }
        }
        if resolver_skylink.is_none() {
            resolver_skylink = Some(hop_link);
        }

        let data = hex_to_bytes("proof.data", &hop.data, "response")?;
        let signature = decode_proof_signature(hop)?;

        let entry = RegistryEntry::new(hop.datakey.clone(), data.clone(), hop.revision);
        if !verify_entry_with_key(&public_key, &entry, &signature, true)? {
            return Err(SkyError::Trust(
                "Could not verify signature from retrieved, signed registry entry in registry proof"
                    .to_string(),
            ));
        }

        last_skylink = Some(encode_skylink_base64(&data));
    }

    // last_skylink is set: the chain is non-empty.
    let skylink = last_skylink.unwrap_or_default();
    if let Some(target) = target {
        if skylink != target.data_link {
            return Err(SkyError::Trust(
                "Could not verify registry proof chain".to_string(),
            ));
        }
    }

    Ok(ResolvedProof {
        skylink,
        resolver_skylink: resolver_skylink.unwrap_or_default(),
    })
}

/// The front door for a portal response: check the returned skylink and
/// `skynet-proof` header against the skylink that was requested.
///
/// A V1 request needs no proof and the portal must echo the link back; a V2
/// request must come back with a different (resolved) link and a chain that
/// verifies from the input to it.
pub fn validate_registry_proof_response(
    input_skylink: &str,
    data_link: &str,
    proof_header: Option<&str>,
) -> SkyResult<()> {
    let proof = parse_proof_header(proof_header)?;

    if Skylink::decode(input_skylink)?.is_v1() {
        if input_skylink != data_link {
            return Err(SkyError::Trust(
                "Expected returned skylink to be the same as input data link".to_string(),
            ));
        }
        if !proof.is_empty() {
            return Err(SkyError::Trust(
                "Expected 'skynet-proof' header to be empty for data link".to_string(),
            ));
        }
        return Ok(());
    }

    if input_skylink == data_link {
        return Err(SkyError::Trust(
            "Expected returned skylink to be different from input entry link".to_string(),
        ));
    }

    let target = ProofTarget {
        resolver_skylink: input_skylink.to_string(),
        data_link: data_link.to_string(),
    };
    validate_registry_proof(&proof, Some(&target))?;
    Ok(())
}

fn parse_proof_header(proof_header: Option<&str>) -> SkyResult<Vec<RegistryProof>> {
    match proof_header {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).map_err(|_| {
            SkyError::Format("Could not parse 'skynet-proof' header as JSON".to_string())
        }),
    }
}

fn decode_proof_public_key(hop: &RegistryProof) -> SkyResult<SiaPublicKey> {
    let bytes = STANDARD
        .decode(&hop.publickey.key)
        .map_err(|e| anyhow::anyhow!("invalid proof public key: {e}"))?;
    let key: [u8; PUBLIC_KEY_SIZE] = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("invalid proof public key length: {}", bytes.len()))?;
    Ok(SiaPublicKey::from_bytes(key))
}

fn decode_proof_signature(hop: &RegistryProof) -> SkyResult<[u8; SIGNATURE_LENGTH]> {
    let bytes = hex_to_bytes("proof.signature", &hop.signature, "response")?;
    let signature: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        anyhow::anyhow!("invalid proof signature length: {}", bytes.len())
    })?;
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROOF_DATA: &str =
        "5c006f8bb26d25b412300703c275279a9d852833e383cfed4d314fe01c0c4b155d12";
    const PROOF_DATAKEY: &str =
        "43c8a9b01609544ab152dad397afc3b56c1518eb546750dbc6cad5944fec0292";
    const PROOF_PUBKEY: &str = "y/l99FyfFm6JPhZL5xSkruhA06Qh9m5S9rnipQCc+rw=";
    const PROOF_SIGNATURE: &str = "5a1437508eedb6f5352d7f744693908a91bb05c01370ce4743de9c25f761b4e87760b8172448c073a4ddd9d58d1a2bf978b3227e57e4fa8cbe830a2353be2207";

    const DATA_LINK: &str = "XABvi7JtJbQSMAcDwnUnmp2FKDPjg8_tTTFP4BwMSxVdEg";
    const RESOLVER_LINK: &str = "AQDwh1jnoZas9LaLHC_D4-2yP9XYDdZzNtz62H4Dww1jDA";

    fn valid_hop() -> RegistryProof {
        serde_json::from_value(serde_json::json!({
            "data": PROOF_DATA,
            "revision": 0,
            "datakey": PROOF_DATAKEY,
            "publickey": { "algorithm": "ed25519", "key": PROOF_PUBKEY },
            "signature": PROOF_SIGNATURE,
            "type": 1,
        }))
        .unwrap()
    }

    #[test]
    fn verifies_a_valid_proof() {
        let resolved = validate_registry_proof(&[valid_hop()], None).unwrap();
        assert_eq!(resolved.skylink, DATA_LINK);
        assert_eq!(resolved.resolver_skylink, RESOLVER_LINK);
    }

    #[test]
    fn verifies_against_matching_target() {
        let target = ProofTarget {
            resolver_skylink: RESOLVER_LINK.to_string(),
            data_link: DATA_LINK.to_string(),
        };
        validate_registry_proof(&[valid_hop()], Some(&target)).unwrap();
    }

    #[test]
    fn rejects_empty_proof() {
        let err = validate_registry_proof(&[], None).unwrap_err();
        assert_eq!(err.to_string(), "Expected registry proof not to be empty");
    }

    #[test]
    fn rejects_unsupported_registry_type() {
        let mut hop = valid_hop();
        hop.entry_type = 2;
        let err = validate_registry_proof(&[hop], None).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported registry type in proof: '2'");
    }

    #[test]
    fn rejects_tampered_signature() {
        let mut hop = valid_hop();
        let mut signature = PROOF_SIGNATURE.to_string();
        signature.replace_range(..2, "00");
        hop.signature = signature;
        let err = validate_registry_proof(&[hop], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not verify signature from retrieved, signed registry entry in registry proof"
        );
    }

    #[test]
    fn rejects_tampered_data() {
        let mut hop = valid_hop();
        let mut data = PROOF_DATA.to_string();
        data.replace_range(..2, "00");
        hop.data = data;
        let err = validate_registry_proof(&[hop], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not verify signature from retrieved, signed registry entry in registry proof"
        );
    }

    #[test]
    fn rejects_wrong_resolver_target() {
        let target = ProofTarget {
            resolver_skylink: DATA_LINK.to_string(),
            data_link: DATA_LINK.to_string(),
        };
        let err = validate_registry_proof(&[valid_hop()], Some(&target)).unwrap_err();
        assert_eq!(err.to_string(), "Could not verify registry proof chain");
    }

    #[test]
    fn rejects_wrong_data_link_target() {
        let target = ProofTarget {
            resolver_skylink: RESOLVER_LINK.to_string(),
            data_link: RESOLVER_LINK.to_string(),
        };
        let err = validate_registry_proof(&[valid_hop()], Some(&target)).unwrap_err();
        assert_eq!(err.to_string(), "Could not verify registry proof chain");
    }

    fn valid_header() -> String {
        serde_json::json!([{
            "data": PROOF_DATA,
            "revision": 0,
            "datakey": PROOF_DATAKEY,
            "publickey": { "algorithm": "ed25519", "key": PROOF_PUBKEY },
            "signature": PROOF_SIGNATURE,
            "type": 1,
        }])
        .to_string()
    }

    #[test]
    fn response_with_v1_input_must_echo_the_link() {
        validate_registry_proof_response(DATA_LINK, DATA_LINK, None).unwrap();
        validate_registry_proof_response(DATA_LINK, DATA_LINK, Some("null")).unwrap();

        let err = validate_registry_proof_response(DATA_LINK, RESOLVER_LINK, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected returned skylink to be the same as input data link"
        );

        let err = validate_registry_proof_response(DATA_LINK, DATA_LINK, Some(&valid_header()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected 'skynet-proof' header to be empty for data link"
        );
    }

    #[test]
    fn response_with_v2_input_needs_a_resolving_chain() {
        let header = valid_header();
        validate_registry_proof_response(RESOLVER_LINK, DATA_LINK, Some(&header)).unwrap();

        let err =
            validate_registry_proof_response(RESOLVER_LINK, RESOLVER_LINK, Some(&header))
                .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected returned skylink to be different from input entry link"
        );
    }

    #[test]
    fn response_rejects_unparseable_header() {
        let err =
            validate_registry_proof_response(RESOLVER_LINK, DATA_LINK, Some("{not json"))
                .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not parse 'skynet-proof' header as JSON"
        );
    }
}
