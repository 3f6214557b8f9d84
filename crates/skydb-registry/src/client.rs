//! The registry client: read and write signed entries through a portal,
//! verifying every fetched signature before handing the entry to the caller.

use tracing::warn;

use skydb_core::error::{hex_to_bytes, validate_hex_string};
use skydb_core::registry::{validate_entry_data_len, RegistryEntry, SignedRegistryEntry};
use skydb_core::sia::SiaPublicKey;
use skydb_core::skylink::format_skylink;
use skydb_core::{SkyError, SkyResult, ED25519_PREFIX, PUBLIC_KEY_SIZE, SIGNATURE_LENGTH};
use skydb_crypto::hash::{hash_data_key, new_resolver_link};
use skydb_crypto::keys::{sign_entry, verify_entry};

use crate::portal::{Portal, PutEntryPublicKey, PutEntryRequest};

/// Options for `get_entry` and `get_entry_link`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetEntryOptions {
    /// Treat the data key as an already-hashed hex tweak.
    pub hashed_data_key_hex: bool,
}

/// Options for `set_entry`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetEntryOptions {
    /// Treat the data key as an already-hashed hex tweak.
    pub hashed_data_key_hex: bool,
}

/// A registry client over some portal transport.
#[derive(Debug)]
pub struct RegistryClient<P> {
    portal: P,
}

impl<P: Portal> RegistryClient<P> {
    pub fn new(portal: P) -> Self {
        RegistryClient { portal }
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    /// Fetch a signed entry, or `None` when the registry has no entry for
    /// this key pair.
    ///
    /// The portal's signature is re-verified against the canonical entry
    /// hash; a mismatch is a trust failure, never silently returned.
    pub async fn get_entry(
        &self,
        public_key: &str,
        data_key: &str,
        opts: &GetEntryOptions,
    ) -> SkyResult<Option<SignedRegistryEntry>> {
        let public_key_hex = public_key.strip_prefix(ED25519_PREFIX).unwrap_or(public_key);
        validate_hex_string("publicKey", public_key_hex, "parameter")?;
        let data_key_hash = data_key_hash_hex(data_key, opts.hashed_data_key_hex)?;

        let Some(raw) = self.portal.fetch_entry(public_key_hex, &data_key_hash).await? else {
            return Ok(None);
        };

        let data = hex::decode(&raw.data).map_err(incomplete_response)?;
        let revision: u64 = raw.revision.parse().map_err(incomplete_response)?;
        let signature_bytes = hex::decode(&raw.signature).map_err(incomplete_response)?;
        let signature: [u8; SIGNATURE_LENGTH] = signature_bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| {
                incomplete_response(format!("signature length {}", bytes.len()))
            })?;

        let entry = RegistryEntry::new(data_key, data, revision);
        if !verify_entry(public_key_hex, &entry, &signature, opts.hashed_data_key_hex)? {
            warn!(public_key = public_key_hex, data_key, "registry entry signature mismatch");
            return Err(SkyError::Trust(
                "Could not verify signature from retrieved, signed registry entry -- possible corrupted entry"
                    .to_string(),
            ));
        }

        Ok(Some(SignedRegistryEntry { entry, signature }))
    }

    /// Sign an entry with the hex private key and post it.
    pub async fn set_entry(
        &self,
        private_key: &str,
        entry: &RegistryEntry,
        opts: &SetEntryOptions,
    ) -> SkyResult<()> {
        validate_hex_string("privateKey", private_key, "parameter")?;
        validate_entry_data_len(entry)?;

        let signature = sign_entry(private_key, entry, opts.hashed_data_key_hex)?;
        let public_key_hex = public_key_from_private_key(private_key)?;
        let public_key_bytes = hex_to_bytes("publicKey", &public_key_hex, "parameter")?;

        let request = PutEntryRequest {
            publickey: PutEntryPublicKey {
                algorithm: "ed25519".to_string(),
                key: public_key_bytes,
            },
            datakey: data_key_hash_hex(&entry.data_key, opts.hashed_data_key_hex)?,
            data: entry.data.clone(),
            revision: entry.revision.to_string(),
            signature: signature.to_vec(),
        };
        self.portal.put_entry(&request).await
    }

    /// The V2 resolver skylink an entry is reachable at, `sia://` prefixed.
    pub fn get_entry_link(
        &self,
        public_key: &str,
        data_key: &str,
        opts: &GetEntryOptions,
    ) -> SkyResult<String> {
        entry_link(public_key, data_key, opts.hashed_data_key_hex)
    }
}

/// Compute the resolver link without needing a client instance; the proof
/// verifier recomputes one per hop.
pub(crate) fn entry_link(
    public_key: &str,
    data_key: &str,
    hashed_data_key_hex: bool,
) -> SkyResult<String> {
    let public_key_hex = public_key.strip_prefix(ED25519_PREFIX).unwrap_or(public_key);
    let sia_public_key = SiaPublicKey::new_ed25519(public_key_hex)?;
    let tweak = if hashed_data_key_hex {
        hex_to_bytes("dataKey", data_key, "parameter")?
    } else {
        hash_data_key(data_key).to_vec()
    };
    let link = new_resolver_link(&sia_public_key, &tweak);
    Ok(format_skylink(&link.to_base64()))
}

/// The public half of a 64-byte hex private key (seed then public key).
pub fn public_key_from_private_key(private_key: &str) -> SkyResult<String> {
    validate_hex_string("privateKey", private_key, "parameter")?;
    let expected_len = 2 * (PUBLIC_KEY_SIZE + PUBLIC_KEY_SIZE);
    if private_key.len() != expected_len {
        return Err(SkyError::validation(
            "privateKey",
            "parameter",
            format!("'string' of length {expected_len}"),
            format!("length {}", private_key.len()),
        ));
    }
    Ok(private_key[2 * PUBLIC_KEY_SIZE..].to_string())
}

fn data_key_hash_hex(data_key: &str, hashed_data_key_hex: bool) -> SkyResult<String> {
    if hashed_data_key_hex {
        validate_hex_string("dataKey", data_key, "parameter")?;
        Ok(data_key.to_string())
    } else {
        Ok(hex::encode(hash_data_key(data_key)))
    }
}

fn incomplete_response(err: impl std::fmt::Display) -> SkyError {
    SkyError::Format(format!(
        "Did not get a complete entry response despite a successful request. \
         Please try again and report this issue to the devs if it persists. Error: {err}"
    ))
}
