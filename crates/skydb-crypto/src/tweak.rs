//! Discoverable bucket tweaks: the registry data key a public path maps to.
//!
//! Encoding: `[version:1][hash(component):32]...` — one generic hash per
//! `/`-separated path component, then hashed once more.

use skydb_core::encoding::encode_utf8_str;

use crate::hash::hash_all;
use crate::{DISCOVERABLE_BUCKET_TWEAK_VERSION, HASH_LENGTH};

/// The hashed path components of a discoverable bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverableBucketTweak {
    version: u8,
    path: Vec<[u8; HASH_LENGTH]>,
}

impl DiscoverableBucketTweak {
    pub fn new(path: &str) -> Self {
        let path_hashes = path
            .split('/')
            .filter(|component| !component.is_empty())
            .map(hash_path_component)
            .collect();
        DiscoverableBucketTweak {
            version: DISCOVERABLE_BUCKET_TWEAK_VERSION,
            path: path_hashes,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(1 + HASH_LENGTH * self.path.len());
        buffer.push(self.version);
        for level in &self.path {
            buffer.extend_from_slice(level);
        }
        buffer
    }

    pub fn hash(&self) -> [u8; HASH_LENGTH] {
        hash_all(&[&self.encode()])
    }
}

/// Hash one path component the same way a data key is hashed.
pub fn hash_path_component(component: &str) -> [u8; HASH_LENGTH] {
    hash_all(&[&encode_utf8_str(component)])
}

/// The hex registry tweak for a discoverable file path.
pub fn derive_discoverable_file_tweak(path: &str) -> String {
    hex::encode(DiscoverableBucketTweak::new(path).hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_version_byte_plus_component_hashes() {
        let tweak = DiscoverableBucketTweak::new("app.example/file.json");
        let encoded = tweak.encode();
        assert_eq!(encoded.len(), 1 + 2 * HASH_LENGTH);
        assert_eq!(encoded[0], DISCOVERABLE_BUCKET_TWEAK_VERSION);
        assert_eq!(&encoded[1..33], &hash_path_component("app.example"));
        assert_eq!(&encoded[33..], &hash_path_component("file.json"));
    }

    #[test]
    fn empty_components_are_skipped() {
        assert_eq!(
            DiscoverableBucketTweak::new("a//b"),
            DiscoverableBucketTweak::new("a/b")
        );
    }

    #[test]
    fn tweak_is_hex_of_hash() {
        let tweak = derive_discoverable_file_tweak("app.example/file.json");
        assert_eq!(tweak.len(), 64);
        assert_eq!(
            tweak,
            hex::encode(DiscoverableBucketTweak::new("app.example/file.json").hash())
        );
        assert_ne!(tweak, derive_discoverable_file_tweak("app.example/other.json"));
    }

    #[test]
    fn path_component_hash_matches_data_key_hash() {
        assert_eq!(
            hash_path_component("skynet"),
            crate::hash::hash_data_key("skynet")
        );
    }
}
