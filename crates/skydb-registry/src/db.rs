//! SkyDB: a mutable key-value view over the immutable registry.
//!
//! A value lives in an uploaded blob; the registry entry for the data key
//! stores the blob's raw skylink bytes. Writes are optimistic: sign the next
//! revision, post, and on a stale-revision rejection re-fetch and retry up
//! to a bound.

use serde_json::json;
use tracing::debug;

use skydb_core::registry::RegistryEntry;
use skydb_core::{SkyError, SkyResult, Skylink, BASE64_ENCODED_SKYLINK_SIZE};
use skydb_crypto::hash::hash_data_key;

use crate::client::{public_key_from_private_key, GetEntryOptions, RegistryClient, SetEntryOptions};
use crate::portal::{BlobUpload, Portal};

/// Version tag stored alongside JSON payloads, `{"_data": …, "_v": 2}`.
pub const JSON_RESPONSE_VERSION: u64 = 2;

/// How many times a write is retried after a revision conflict before the
/// conflict is surfaced to the caller.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 8;

/// The database handle. Cheap to construct; all state lives in the registry.
#[derive(Debug)]
pub struct SkyDb<P> {
    registry: RegistryClient<P>,
    max_conflict_retries: u32,
}

/// Parse entry data into a skylink. Current entries store the 34 raw bytes;
/// legacy v1 entries stored the 46-character base64 text instead, so a
/// 46-byte payload is decoded as text.
pub fn parse_data_link(data: &[u8]) -> SkyResult<Skylink> {
    if data.len() == BASE64_ENCODED_SKYLINK_SIZE {
        let text = std::str::from_utf8(data).map_err(|_| {
            SkyError::Format("legacy data link is not valid base64 text".to_string())
        })?;
        return Skylink::decode(text);
    }
    Skylink::from_bytes(data)
}

/// The revision the next write must carry: one past the current entry, or 0
/// for a fresh key.
pub fn next_revision(entry: Option<&RegistryEntry>) -> SkyResult<u64> {
    match entry {
        None => Ok(0),
        Some(entry) => entry.revision.checked_add(1).ok_or(SkyError::RevisionOverflow),
    }
}

impl<P: Portal> SkyDb<P> {
    pub fn new(portal: P) -> Self {
        SkyDb {
            registry: RegistryClient::new(portal),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn registry(&self) -> &RegistryClient<P> {
        &self.registry
    }

    /// The current data link for a key, or `None` when the key has no entry
    /// or was deleted (all-zero skylink bytes).
    pub async fn get_data_link(
        &self,
        public_key: &str,
        data_key: &str,
    ) -> SkyResult<Option<Skylink>> {
        let signed = self
            .registry
            .get_entry(public_key, data_key, &GetEntryOptions::default())
            .await?;
        let Some(signed) = signed else {
            return Ok(None);
        };
        if signed.entry.data.is_empty() {
            return Ok(None);
        }
        let link = parse_data_link(&signed.entry.data)?;
        Ok(if link.is_empty() { None } else { Some(link) })
    }

    /// The data link holding a key's JSON value, if any. Downloading and
    /// unwrapping the blob is the transport layer's job.
    pub async fn get_json(&self, public_key: &str, data_key: &str) -> SkyResult<Option<Skylink>> {
        self.get_data_link(public_key, data_key).await
    }

    /// Upload a payload and fetch the current entry concurrently, returning
    /// the entry the next write should post together with the new data link.
    pub async fn get_or_create_entry(
        &self,
        public_key: &str,
        data_key: &str,
        payload: BlobUpload,
    ) -> SkyResult<(RegistryEntry, Skylink)> {
        let get_opts = GetEntryOptions::default();
        let (skylink_text, signed) = tokio::try_join!(
            self.registry.portal().upload_blob(payload),
            self.registry.get_entry(public_key, data_key, &get_opts),
        )?;
        let link = Skylink::decode(&skylink_text)?;
        let revision = next_revision(signed.as_ref().map(|s| &s.entry))?;
        let entry = RegistryEntry::new(data_key, link.as_bytes().to_vec(), revision);
        Ok((entry, link))
    }

    /// Point a key at a skylink, retrying on revision conflicts.
    pub async fn set_data_link(
        &self,
        private_key: &str,
        data_key: &str,
        link: &Skylink,
    ) -> SkyResult<()> {
        self.set_entry_data(private_key, data_key, link.as_bytes().to_vec())
            .await
    }

    /// Store a JSON value under a key and return the data link it landed at.
    pub async fn set_json(
        &self,
        private_key: &str,
        data_key: &str,
        data: &serde_json::Value,
    ) -> SkyResult<Skylink> {
        let public_key = public_key_from_private_key(private_key)?;
        let wrapped = json!({ "_data": data, "_v": JSON_RESPONSE_VERSION });
        let bytes =
            serde_json::to_vec(&wrapped).map_err(|e| anyhow::anyhow!("serializing value: {e}"))?;
        let upload = BlobUpload::json(
            format!("dk:{}", hex::encode(hash_data_key(data_key))),
            bytes,
        );

        let (entry, link) = self
            .get_or_create_entry(&public_key, data_key, upload)
            .await?;
        self.write_with_retry(private_key, &public_key, entry).await?;
        Ok(link)
    }

    /// Delete a key by pointing it at the empty skylink. Revisions keep
    /// counting; a later write resurrects the key at a higher revision.
    pub async fn delete_data_link(&self, private_key: &str, data_key: &str) -> SkyResult<()> {
        self.set_entry_data(private_key, data_key, Skylink::EMPTY.as_bytes().to_vec())
            .await
    }

    /// JSON flavor of [`Self::delete_data_link`]; the registry side is
    /// identical.
    pub async fn delete_json(&self, private_key: &str, data_key: &str) -> SkyResult<()> {
        self.delete_data_link(private_key, data_key).await
    }

    async fn set_entry_data(
        &self,
        private_key: &str,
        data_key: &str,
        data: Vec<u8>,
    ) -> SkyResult<()> {
        let public_key = public_key_from_private_key(private_key)?;
        let signed = self
            .registry
            .get_entry(&public_key, data_key, &GetEntryOptions::default())
            .await?;
        let revision = next_revision(signed.as_ref().map(|s| &s.entry))?;
        let entry = RegistryEntry::new(data_key, data, revision);
        self.write_with_retry(private_key, &public_key, entry).await
    }

    async fn write_with_retry(
        &self,
        private_key: &str,
        public_key: &str,
        mut entry: RegistryEntry,
    ) -> SkyResult<()> {
        let mut attempt = 0u32;
        loop {
            match self
                .registry
                .set_entry(private_key, &entry, &SetEntryOptions::default())
                .await
            {
                Ok(()) => return Ok(()),
                Err(SkyError::Conflict(reason)) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    debug!(attempt, %reason, data_key = %entry.data_key, "retrying after revision conflict");
                    let current = self
                        .registry
                        .get_entry(public_key, &entry.data_key, &GetEntryOptions::default())
                        .await?;
                    entry.revision = next_revision(current.as_ref().map(|s| &s.entry))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
