//! The portal boundary: everything the registry client needs from an HTTP
//! portal, stripped of the transport itself.

use std::future::Future;

use serde::{Deserialize, Serialize};

use skydb_core::SkyResult;

/// A signed entry exactly as the portal's registry endpoint returns it:
/// hex data, decimal-string revision, hex signature. Nothing is validated
/// at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSignedEntry {
    pub data: String,
    pub revision: String,
    pub signature: String,
}

/// The POST body for writing a signed entry.
#[derive(Debug, Clone, Serialize)]
pub struct PutEntryRequest {
    pub publickey: PutEntryPublicKey,
    /// Hashed data key, hex-encoded.
    pub datakey: String,
    pub data: Vec<u8>,
    /// Decimal string, so 64-bit revisions survive JSON intact.
    pub revision: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PutEntryPublicKey {
    pub algorithm: String,
    pub key: Vec<u8>,
}

/// An immutable blob to upload, yielding a skylink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUpload {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl BlobUpload {
    pub fn json(filename: impl Into<String>, data: Vec<u8>) -> Self {
        BlobUpload {
            data,
            filename: filename.into(),
            content_type: "application/json".to_string(),
        }
    }

    pub fn raw(filename: impl Into<String>, data: Vec<u8>) -> Self {
        BlobUpload {
            data,
            filename: filename.into(),
            content_type: "application/octet-stream".to_string(),
        }
    }
}

/// A Skynet portal, reduced to the three operations SkyDB uses.
///
/// Implementations map transport failures to `SkyError::Transport` and a
/// stale-revision rejection on `put_entry` to `SkyError::Conflict`; a missing
/// entry (HTTP 404) is `Ok(None)` from `fetch_entry`, not an error.
pub trait Portal: Send + Sync {
    fn fetch_entry(
        &self,
        public_key_hex: &str,
        data_key_hash_hex: &str,
    ) -> impl Future<Output = SkyResult<Option<RawSignedEntry>>> + Send;

    fn put_entry(&self, request: &PutEntryRequest) -> impl Future<Output = SkyResult<()>> + Send;

    /// Upload a blob and return its skylink.
    fn upload_blob(&self, upload: BlobUpload) -> impl Future<Output = SkyResult<String>> + Send;
}
