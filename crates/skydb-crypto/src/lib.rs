//! Client-side cryptography for SkyDB: the protocol's generic hash, registry
//! entry hashing and signing, seed-phrase codec, identity derivations, and
//! the padded encrypted-file envelope.

pub mod dictionary;
pub mod encrypted;
pub mod hash;
pub mod keys;
pub mod seed;
pub mod tweak;

pub use keys::KeyPair;

/// Raw seed length in bytes. 128 bits: twelve 10-bit words plus one 8-bit
/// word.
pub const SEED_LENGTH: usize = 16;

/// Number of seed words in a phrase.
pub const SEED_WORDS_LENGTH: usize = 13;

/// Number of checksum words appended to the seed words.
pub const CHECKSUM_WORDS_LENGTH: usize = 2;

/// Total phrase length in words.
pub const PHRASE_LENGTH: usize = SEED_WORDS_LENGTH + CHECKSUM_WORDS_LENGTH;

/// Output length of the generic hash.
pub const HASH_LENGTH: usize = 32;

/// Salt for deriving the discoverable-identity keypair from a seed.
pub const SALT_ROOT_DISCOVERABLE_KEY: &str = "root discoverable key";

/// Salt for deriving the root path seed of the encrypted filesystem.
pub const SALT_ENCRYPTED_PATH_SEED: &str = "encrypted filesystem path seed";

/// Salt for deriving a child path seed from its parent.
pub const SALT_ENCRYPTED_CHILD: &str = "encrypted filesystem child";

/// Salt for deriving the registry tweak of an encrypted file.
pub const SALT_ENCRYPTED_TWEAK: &str = "encrypted filesystem tweak";

/// Salt for deriving the encryption key of an encrypted file.
pub const SALT_ENCRYPTION: &str = "encryption";

/// Version byte prepended to a discoverable bucket tweak encoding.
pub const DISCOVERABLE_BUCKET_TWEAK_VERSION: u8 = 1;

/// Path seed length in bytes (64 hex characters).
pub const ENCRYPTION_PATH_SEED_LENGTH: usize = 32;

/// Encryption key length for the file envelope.
pub const ENCRYPTION_KEY_LENGTH: usize = 32;

/// Nonce length of the file envelope AEAD.
pub const ENCRYPTION_NONCE_LENGTH: usize = 24;

/// Length of the plaintext metadata field in the envelope.
pub const ENCRYPTION_HIDDEN_FIELD_METADATA_LENGTH: usize = 16;

/// AEAD authentication tag overhead.
pub const ENCRYPTION_OVERHEAD_LENGTH: usize = 16;

/// Envelope version this client reads and writes.
pub const ENCRYPTED_JSON_RESPONSE_VERSION: u8 = 1;
