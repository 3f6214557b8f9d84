//! Ed25519 keypairs for registry entries and the signing/verification of the
//! canonical entry hash.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use skydb_core::error::{hex_to_bytes, validate_byte_len, validate_hex_string};
use skydb_core::registry::RegistryEntry;
use skydb_core::sia::SiaPublicKey;
use skydb_core::{SkyResult, ED25519_PREFIX, PUBLIC_KEY_SIZE, SIGNATURE_LENGTH};

use crate::hash::hash_registry_entry;

/// Rounds of PBKDF2-HMAC-SHA256 used to stretch a raw seed string into an
/// ed25519 seed.
const SEED_DERIVATION_ROUNDS: u32 = 1000;

/// Length of the private key hex form: 32 seed bytes followed by the 32
/// public key bytes.
const PRIVATE_KEY_SIZE: usize = 64;

/// An ed25519 keypair in the hex forms the registry protocol passes around.
///
/// The private key is the 64-byte seed-then-public layout. Zeroized on drop.
#[derive(Clone)]
pub struct KeyPair {
    public_key: String,
    private_key: String,
}

impl KeyPair {
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public = signing_key.verifying_key().to_bytes();
        let mut secret = [0u8; PRIVATE_KEY_SIZE];
        secret[..PUBLIC_KEY_SIZE].copy_from_slice(&signing_key.to_bytes());
        secret[PUBLIC_KEY_SIZE..].copy_from_slice(&public);
        let key_pair = KeyPair {
            public_key: hex::encode(public),
            private_key: hex::encode(secret),
        };
        secret.zeroize();
        key_pair
    }

    /// Hex public key, without the `ed25519:` prefix.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Hex private key (seed followed by public key).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// A keypair together with the seed string it was derived from.
pub struct KeyPairAndSeed {
    pub key_pair: KeyPair,
    pub seed: String,
}

/// Derive a keypair from a raw seed string: PBKDF2-HMAC-SHA256 with an empty
/// salt and 1000 rounds stretches the seed into 32 ed25519 seed bytes.
pub fn gen_keypair_from_seed(seed: &str) -> SkyResult<KeyPair> {
    let mut derived = [0u8; PUBLIC_KEY_SIZE];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(seed.as_bytes(), b"", SEED_DERIVATION_ROUNDS, &mut derived)
        .map_err(|e| anyhow::anyhow!("seed derivation failed: {e}"))?;
    let signing_key = SigningKey::from_bytes(&derived);
    derived.zeroize();
    Ok(KeyPair::from_signing_key(&signing_key))
}

/// A fresh random seed: `length` bytes of OS randomness, hex-encoded.
pub fn make_seed(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    let seed = hex::encode(&bytes);
    bytes.zeroize();
    seed
}

/// Generate a random seed of `length` bytes and its derived keypair.
pub fn gen_keypair_and_seed(length: usize) -> SkyResult<KeyPairAndSeed> {
    let seed = make_seed(length);
    let key_pair = gen_keypair_from_seed(&seed)?;
    Ok(KeyPairAndSeed { key_pair, seed })
}

/// Sign an entry's canonical hash with a hex private key.
pub fn sign_entry(
    private_key: &str,
    entry: &RegistryEntry,
    hashed_data_key_hex: bool,
) -> SkyResult<[u8; SIGNATURE_LENGTH]> {
    validate_hex_string("privateKey", private_key, "parameter")?;
    let mut secret = hex_to_bytes("privateKey", private_key, "parameter")?;
    validate_byte_len("privateKey", &secret, "parameter", PRIVATE_KEY_SIZE)?;

    let mut seed = [0u8; PUBLIC_KEY_SIZE];
    seed.copy_from_slice(&secret[..PUBLIC_KEY_SIZE]);
    secret.zeroize();
    let signing_key = SigningKey::from_bytes(&seed);
    seed.zeroize();

    let hash = hash_registry_entry(entry, hashed_data_key_hex)?;
    Ok(signing_key.sign(&hash).to_bytes())
}

/// Verify a detached entry signature. Callers turn a `false` on fetched data
/// into a trust failure; this function only answers the math.
pub fn verify_entry(
    public_key: &str,
    entry: &RegistryEntry,
    signature: &[u8; SIGNATURE_LENGTH],
    hashed_data_key_hex: bool,
) -> SkyResult<bool> {
    let hex = public_key.strip_prefix(ED25519_PREFIX).unwrap_or(public_key);
    let bytes = hex_to_bytes("publicKey", hex, "parameter")?;
    validate_byte_len("publicKey", &bytes, "parameter", PUBLIC_KEY_SIZE)?;
    let mut key = [0u8; PUBLIC_KEY_SIZE];
    key.copy_from_slice(&bytes);

    let verifying_key = VerifyingKey::from_bytes(&key)
        .map_err(|e| anyhow::anyhow!("invalid ed25519 public key: {e}"))?;
    let hash = hash_registry_entry(entry, hashed_data_key_hex)?;
    Ok(verifying_key
        .verify(&hash, &Signature::from_bytes(signature))
        .is_ok())
}

/// Verify against a parsed Sia public key, as the proof verifier holds one.
pub fn verify_entry_with_key(
    public_key: &SiaPublicKey,
    entry: &RegistryEntry,
    signature: &[u8; SIGNATURE_LENGTH],
    hashed_data_key_hex: bool,
) -> SkyResult<bool> {
    let verifying_key = VerifyingKey::from_bytes(&public_key.key)
        .map_err(|e| anyhow::anyhow!("invalid ed25519 public key: {e}"))?;
    let hash = hash_registry_entry(entry, hashed_data_key_hex)?;
    Ok(verifying_key
        .verify(&hash, &Signature::from_bytes(signature))
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "c1197e1275fbf570d21dde01a00af83ed4a743d1884e4a09cebce0dd21ae254c";
    const PUBLIC_KEY: &str = "f8a7da8324fabb9d57bb32c59c48d4ba304d08ee5f1297a46836cf841da71c80";

    #[test]
    fn keypair_from_seed_vector() {
        let key_pair = gen_keypair_from_seed(SEED).unwrap();
        assert_eq!(key_pair.public_key(), PUBLIC_KEY);
        assert_eq!(
            key_pair.private_key(),
            format!(
                "c404ff07fba961000dfb25ece7477f45b109b50a5169a45f3fb239343002c1cf{PUBLIC_KEY}"
            )
        );
    }

    #[test]
    fn keypair_derivation_is_deterministic() {
        let a = gen_keypair_from_seed("some seed").unwrap();
        let b = gen_keypair_from_seed("some seed").unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(
            a.public_key(),
            gen_keypair_from_seed("other seed").unwrap().public_key()
        );
    }

    #[test]
    fn debug_redacts_private_key() {
        let key_pair = gen_keypair_from_seed(SEED).unwrap();
        let debug = format!("{key_pair:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c404ff07"));
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let key_pair = gen_keypair_from_seed(SEED).unwrap();
        let entry = RegistryEntry::new("app", b"hello".to_vec(), 3);

        let signature = sign_entry(key_pair.private_key(), &entry, false).unwrap();
        assert!(verify_entry(key_pair.public_key(), &entry, &signature, false).unwrap());
    }

    #[test]
    fn tampered_entry_fails_verification() {
        let key_pair = gen_keypair_from_seed(SEED).unwrap();
        let entry = RegistryEntry::new("app", b"hello".to_vec(), 3);
        let signature = sign_entry(key_pair.private_key(), &entry, false).unwrap();

        let mut tampered = entry.clone();
        tampered.revision = 4;
        assert!(!verify_entry(key_pair.public_key(), &tampered, &signature, false).unwrap());

        let mut tampered = entry;
        tampered.data = b"hellp".to_vec();
        assert!(!verify_entry(key_pair.public_key(), &tampered, &signature, false).unwrap());
    }

    #[test]
    fn verify_accepts_prefixed_public_key() {
        let key_pair = gen_keypair_from_seed(SEED).unwrap();
        let entry = RegistryEntry::new("app", b"x".to_vec(), 0);
        let signature = sign_entry(key_pair.private_key(), &entry, false).unwrap();
        let prefixed = format!("ed25519:{}", key_pair.public_key());
        assert!(verify_entry(&prefixed, &entry, &signature, false).unwrap());
    }

    #[test]
    fn gen_keypair_and_seed_is_self_consistent() {
        let generated = gen_keypair_and_seed(64).unwrap();
        assert_eq!(generated.seed.len(), 128);
        let rederived = gen_keypair_from_seed(&generated.seed).unwrap();
        assert_eq!(generated.key_pair.public_key(), rederived.public_key());
    }
}
