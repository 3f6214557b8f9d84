//! The 15-word seed phrase codec and the identity derivations rooted in a
//! seed.
//!
//! A phrase carries a 128-bit seed as thirteen dictionary words (twelve
//! 10-bit values and one 8-bit value, most-significant-bit first) followed by
//! two checksum words taken from `SHA-512(seed)`. Word lookup is tolerant:
//! only the first three letters of each word matter.

use rand::Rng;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use skydb_core::{SkyError, SkyResult};

use crate::dictionary::DICTIONARY;
use crate::keys::KeyPair;
use crate::{
    CHECKSUM_WORDS_LENGTH, ENCRYPTION_PATH_SEED_LENGTH, PHRASE_LENGTH,
    SALT_ENCRYPTED_PATH_SEED, SALT_ROOT_DISCOVERABLE_KEY, SEED_LENGTH, SEED_WORDS_LENGTH,
};

/// A raw 128-bit seed.
pub type Seed = [u8; SEED_LENGTH];

/// The thirteen packed word values of a seed; the last is 8 bits wide.
pub type SeedWords = [u16; SEED_WORDS_LENGTH];

pub(crate) fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Generate a fresh random seed phrase.
pub fn generate_seed_phrase() -> String {
    let mut rng = rand::thread_rng();
    let mut seed_words: SeedWords = [0; SEED_WORDS_LENGTH];
    for (i, word) in seed_words.iter_mut().enumerate() {
        let num_bits = if i == SEED_WORDS_LENGTH - 1 { 8 } else { 10 };
        *word = rng.gen_range(0..1u16 << num_bits);
    }
    let (check0, check1) = checksum_words_from_seed_words(&seed_words);

    let mut phrase = Vec::with_capacity(PHRASE_LENGTH);
    for word in seed_words {
        phrase.push(DICTIONARY[word as usize]);
    }
    phrase.push(DICTIONARY[check0 as usize]);
    phrase.push(DICTIONARY[check1 as usize]);
    phrase.join(" ")
}

/// Lowercase, trim, and collapse runs of spaces.
pub fn sanitize_phrase(phrase: &str) -> String {
    phrase
        .trim()
        .to_lowercase()
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a phrase and extract its seed.
///
/// Errors carry the exact reason: wrong word count, a word under three
/// letters, an unknown prefix, a 13th word outside the low 256 dictionary
/// entries, or a checksum mismatch.
pub fn validate_phrase(phrase: &str) -> SkyResult<Seed> {
    let phrase = sanitize_phrase(phrase);
    let words: Vec<&str> = phrase.split(' ').collect();
    if words.len() != PHRASE_LENGTH {
        return Err(SkyError::Format(format!(
            "Phrase must be '{PHRASE_LENGTH}' words long, was '{}'",
            words.len()
        )));
    }

    let mut seed_words: SeedWords = [0; SEED_WORDS_LENGTH];
    for (i, word) in words.iter().enumerate() {
        if word.len() < 3 {
            return Err(SkyError::Format(format!(
                "Word {} is not at least 3 letters long",
                i + 1
            )));
        }
        let prefix = &word.as_bytes()[..3];
        let bound = if i == SEED_WORDS_LENGTH - 1 {
            256
        } else {
            DICTIONARY.len()
        };

        let mut found = None;
        for (j, candidate) in DICTIONARY[..bound].iter().enumerate() {
            let candidate_prefix = &candidate.as_bytes()[..3];
            if candidate_prefix == prefix {
                found = Some(j);
                break;
            }
            // the dictionary is sorted
            if candidate_prefix > prefix {
                break;
            }
        }

        let index = match found {
            Some(index) => index,
            None if i == SEED_WORDS_LENGTH - 1 => {
                return Err(SkyError::Format(format!(
                    "Prefix for word {} must be found in the first 256 words of the dictionary",
                    i + 1
                )));
            }
            None => {
                return Err(SkyError::Format(format!(
                    "Unrecognized prefix \"{}\" at word {}, not found in dictionary",
                    String::from_utf8_lossy(prefix),
                    i + 1
                )));
            }
        };

        // words 14 and 15 are checksum, handled below
        if i < SEED_WORDS_LENGTH {
            seed_words[i] = index as u16;
        }
    }

    let (check0, check1) = checksum_words_from_seed_words(&seed_words);
    for (offset, checksum_word) in [check0, check1].into_iter().enumerate() {
        let expected_prefix = &DICTIONARY[checksum_word as usize].as_bytes()[..3];
        let given = words[SEED_WORDS_LENGTH + offset];
        if &given.as_bytes()[..3] != expected_prefix {
            return Err(SkyError::Format(format!(
                "Word '{given}' is not a valid checksum for the seed"
            )));
        }
    }

    Ok(seed_words_to_seed(&seed_words))
}

/// Convert a phrase to its seed, failing with the validation reason.
pub fn phrase_to_seed(phrase: &str) -> SkyResult<Seed> {
    validate_phrase(phrase)
}

/// Render a seed as its canonical 15-word phrase.
pub fn seed_to_phrase(seed: &Seed) -> String {
    let seed_words = seed_to_seed_words(seed);
    let (check0, check1) = checksum_words_from_seed_words(&seed_words);

    let mut phrase = Vec::with_capacity(PHRASE_LENGTH);
    for word in seed_words {
        phrase.push(DICTIONARY[word as usize]);
    }
    phrase.push(DICTIONARY[check0 as usize]);
    phrase.push(DICTIONARY[check1 as usize]);
    phrase.join(" ")
}

/// Pack thirteen word values into 16 seed bytes, MSB first.
pub fn seed_words_to_seed(seed_words: &SeedWords) -> Seed {
    let mut bytes = [0u8; SEED_LENGTH];
    let mut cur_byte = 0;
    let mut cur_bit = 0;

    for (i, &word) in seed_words.iter().enumerate() {
        let word_bits = if i == SEED_WORDS_LENGTH - 1 { 8 } else { 10 };
        for j in 0..word_bits {
            if word & (1 << (word_bits - j - 1)) != 0 {
                bytes[cur_byte] |= 1 << (8 - cur_bit - 1);
            }
            cur_bit += 1;
            if cur_bit >= 8 {
                cur_byte += 1;
                cur_bit = 0;
            }
        }
    }
    bytes
}

/// Unpack 16 seed bytes into thirteen word values, MSB first.
pub fn seed_to_seed_words(seed: &Seed) -> SeedWords {
    let mut words: SeedWords = [0; SEED_WORDS_LENGTH];
    let mut cur_word = 0;
    let mut cur_bit = 0;
    let mut word_bits = 10;

    for &byte in seed {
        for j in 0..8 {
            if byte & (1 << (8 - j - 1)) != 0 {
                words[cur_word] |= 1 << (word_bits - cur_bit - 1);
            }
            cur_bit += 1;
            if cur_bit >= word_bits {
                cur_word += 1;
                cur_bit = 0;
                if cur_word == SEED_WORDS_LENGTH - 1 {
                    word_bits = 8;
                }
            }
        }
    }
    words
}

/// The two 10-bit checksum words for a packed seed.
pub fn checksum_words_from_seed_words(seed_words: &SeedWords) -> (u16, u16) {
    let seed = seed_words_to_seed(seed_words);
    let hash = sha512(&seed);
    hash_to_checksum_words(&hash)
}

/// Extract the two leading 10-bit fields of a hash.
pub fn hash_to_checksum_words(hash: &[u8]) -> (u16, u16) {
    let word0 = (((hash[0] as u32) << 8) + hash[1] as u32) >> 6;
    let word1 = ((((hash[1] as u32) << 10) & 0xffff) + ((hash[2] as u32) << 2)) >> 6;
    (word0 as u16, word1 as u16)
}

/// Derive the discoverable-identity keypair from a seed string.
///
/// The ed25519 seed is `SHA-512(SHA-512(salt) ++ SHA-512(seed))[..32]`. This
/// is distinct from the PBKDF2 derivation in [`crate::keys`]; the two must
/// not be conflated.
pub fn gen_root_keypair_from_seed(seed: &str) -> KeyPair {
    let mut ed25519_seed = salted_seed_hash(SALT_ROOT_DISCOVERABLE_KEY, seed);
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&ed25519_seed);
    ed25519_seed.zeroize();
    KeyPair::from_signing_key(&signing_key)
}

/// Derive the root path seed of the encrypted filesystem from a seed string.
pub fn derive_root_path_seed(seed: &str) -> String {
    let root = salted_seed_hash(SALT_ENCRYPTED_PATH_SEED, seed);
    hex::encode(&root[..ENCRYPTION_PATH_SEED_LENGTH])
}

fn salted_seed_hash(salt: &str, seed: &str) -> [u8; 32] {
    let mut data = Vec::with_capacity(128);
    data.extend_from_slice(&sha512(salt.as_bytes()));
    data.extend_from_slice(&sha512(seed.as_bytes()));
    let hash = sha512(&data);
    data.zeroize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash[..32]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VALID_DICTIONARY_PHRASES: [&str; 3] = [
        "vector items adopt agenda ticket nagged devoid onward geyser mime eleven frown apart origin woes",
        " abbey    abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey amidst punch   ",
        "yanks yanks yanks yanks yanks yanks yanks yanks yanks yanks yanks yanks eggs voyage topic  ",
    ];

    #[test]
    fn valid_phrases_pass_validation() {
        let mut phrases = VALID_DICTIONARY_PHRASES.to_vec();
        // words outside the dictionary but with valid prefixes
        phrases.push(
            "abb about yanked yah unctuous spry mayflower malodious jabba irish gazebo bombastic eggplant acer avoidance",
        );
        for phrase in phrases {
            assert!(validate_phrase(phrase).is_ok(), "failed on: {phrase}");
        }
    }

    #[test]
    fn invalid_phrases_fail_with_exact_messages() {
        let cases = [
            (
                "abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey pastry abbey",
                "Phrase must be '15' words long, was '14'",
            ),
            (
                "abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey",
                "Phrase must be '15' words long, was '16'",
            ),
            (
                "ab ab ab ab ab ab ab ab ab ab ab ab ab ab ab ",
                "Word 1 is not at least 3 letters long",
            ),
            (
                "abzey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey abbey",
                "Unrecognized prefix \"abz\" at word 1, not found in dictionary",
            ),
            (
                "eggs abbey eggs abbey eggs abbey eggs abbey eggs abbey eggs abbey eight abbey eggs",
                "Prefix for word 13 must be found in the first 256 words of the dictionary",
            ),
        ];
        for (phrase, message) in cases {
            let err = validate_phrase(phrase).unwrap_err();
            assert_eq!(err.to_string(), message, "failed on: {phrase}");
        }
    }

    #[test]
    fn generated_phrases_validate() {
        for _ in 0..100 {
            let phrase = generate_seed_phrase();
            assert!(validate_phrase(&phrase).is_ok(), "failed on: {phrase}");
        }
    }

    #[test]
    fn phrase_seed_phrase_roundtrip() {
        for phrase in VALID_DICTIONARY_PHRASES {
            let seed = phrase_to_seed(phrase).unwrap();
            assert_eq!(seed_to_phrase(&seed), sanitize_phrase(phrase));
        }
    }

    #[test]
    fn checksum_words_saturated_hash() {
        assert_eq!(hash_to_checksum_words(&[0xff; 64]), (1023, 1023));
    }

    #[test]
    fn checksum_words_custom_bytes() {
        let (word0, word1) = hash_to_checksum_words(&[0b01011100, 0b00110011, 0b01010101]);
        assert_eq!(word0, 0b0101110000);
        assert_eq!(word1, 0b1100110101);
    }

    #[test]
    fn seed_words_bit_packing_vector() {
        let seed_words: SeedWords = [
            0b0101110001,
            0b1000110011,
            0b1001010101,
            0b0101110010,
            0b0100010100,
            0b1101111111,
            0b0000000001,
            0b1111111110,
            0b0001111000,
            0b1111000001,
            0b0111001100,
            0b0110100111,
            0b11100101,
        ];
        let seed = seed_words_to_seed(&seed_words);
        assert_eq!(
            seed,
            [
                0b01011100, 0b01100011, 0b00111001, 0b01010101, 0b01110010, 0b01000101,
                0b00110111, 0b11110000, 0b00000111, 0b11111110, 0b00011110, 0b00111100,
                0b00010111, 0b00110001, 0b10100111, 0b11100101,
            ]
        );
        assert_eq!(seed_to_seed_words(&seed), seed_words);
    }

    #[test]
    fn sanitize_collapses_case_and_spaces() {
        assert_eq!(sanitize_phrase("  Abbey   ABBEY abbey "), "abbey abbey abbey");
    }

    #[test]
    fn root_keypair_differs_from_pbkdf2_keypair() {
        let seed = "c1197e1275fbf570d21dde01a00af83ed4a743d1884e4a09cebce0dd21ae254c";
        let root = gen_root_keypair_from_seed(seed);
        let raw = crate::keys::gen_keypair_from_seed(seed).unwrap();
        assert_ne!(root.public_key(), raw.public_key());
    }

    #[test]
    fn root_derivations_are_deterministic() {
        let phrase = VALID_DICTIONARY_PHRASES[0];
        let root_a = gen_root_keypair_from_seed(phrase);
        let root_b = gen_root_keypair_from_seed(phrase);
        assert_eq!(root_a.public_key(), root_b.public_key());

        let path_seed = derive_root_path_seed(phrase);
        assert_eq!(path_seed.len(), 64);
        assert_eq!(path_seed, derive_root_path_seed(phrase));
        // keypair and path seed use different salts
        assert_ne!(path_seed, root_a.public_key());
    }

    proptest! {
        #[test]
        fn seed_phrase_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 16)) {
            let mut seed = [0u8; 16];
            seed.copy_from_slice(&bytes);
            let phrase = seed_to_phrase(&seed);
            prop_assert_eq!(phrase_to_seed(&phrase).unwrap(), seed);
        }

        #[test]
        fn seed_words_roundtrip(words in proptest::array::uniform13(0u16..1024)) {
            let mut words = words;
            words[12] &= 0xff; // last word is 8 bits
            let seed = seed_words_to_seed(&words);
            prop_assert_eq!(seed_to_seed_words(&seed), words);
        }
    }
}
