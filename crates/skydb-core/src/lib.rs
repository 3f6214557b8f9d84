//! Shared value types for the SkyDB client: the skylink codec, Sia binary
//! encodings, registry entry types, and the error taxonomy the other crates
//! build on.

pub mod encoding;
pub mod error;
pub mod parse;
pub mod registry;
pub mod sia;
pub mod skylink;

pub use error::{SkyError, SkyResult};
pub use skylink::Skylink;

/// URI scheme prefix for skylinks.
pub const URI_SKYNET_PREFIX: &str = "sia://";

/// Prefix marking a hex public key as ed25519.
pub const ED25519_PREFIX: &str = "ed25519:";

/// Size of a raw skylink: 1 bitfield byte, 1 reserved byte, 32 root bytes.
pub const RAW_SKYLINK_SIZE: usize = 34;

/// Length of a base64-encoded skylink.
pub const BASE64_ENCODED_SKYLINK_SIZE: usize = 46;

/// Length of a base32-encoded skylink.
pub const BASE32_ENCODED_SKYLINK_SIZE: usize = 55;

/// Size of a Sia algorithm specifier.
pub const SPECIFIER_LEN: usize = 16;

/// Size of an ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an ed25519 detached signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Maximum size of registry entry data.
pub const MAX_ENTRY_LENGTH: usize = 70;

/// The only registry entry type the proof verifier accepts.
pub const REGISTRY_TYPE_WITHOUT_PUBKEY: u32 = 1;
