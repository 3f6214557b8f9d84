use thiserror::Error;

pub type SkyResult<T> = Result<T, SkyError>;

/// Error taxonomy for the SkyDB client core.
///
/// The split matters for callers: `Validation`/`Format` are malformed inputs
/// and never retryable, `Trust` means a signature did not verify on fetched
/// data (possible tampering — never downgrade to a transport failure),
/// `Conflict` is the one recoverable case (stale revision on write), and the
/// overflow variants are terminal protocol limits.
#[derive(Debug, Error)]
pub enum SkyError {
    /// A value failed a shape check. The message follows the
    /// "name, kind, expected, actual" contract so failures are debuggable
    /// without a debugger.
    #[error("Expected '{kind}', '{name}', to be {expected}, was {actual}")]
    Validation {
        name: String,
        kind: String,
        expected: String,
        actual: String,
    },

    /// Malformed protocol data: wrong skylink size, bad phrase word,
    /// bad padding boundary, unknown envelope version.
    #[error("{0}")]
    Format(String),

    /// Signature verification failed on fetched data.
    #[error("{0}")]
    Trust(String),

    /// The registry rejected a write because the revision was stale.
    #[error("registry write conflict: {0}")]
    Conflict(String),

    /// The entry is already at revision 2^64-1.
    #[error("Current entry already has maximum allowed revision, could not update the entry")]
    RevisionOverflow,

    /// The progressive padding schedule is exhausted.
    #[error("Could not pad file size, overflow detected.")]
    PaddingOverflow,

    /// The portal collaborator failed with a non-2xx, non-404 response.
    #[error("Request failed with status code {status}")]
    Transport { status: u16 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SkyError {
    pub fn validation(
        name: impl Into<String>,
        kind: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        SkyError::Validation {
            name: name.into(),
            kind: kind.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// True if the string is non-empty, even-length hex.
pub fn is_hex_string(value: &str) -> bool {
    !value.is_empty() && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check that `value` is a hex-encoded string, per the validation contract.
pub fn validate_hex_string(name: &str, value: &str, kind: &str) -> SkyResult<()> {
    if !is_hex_string(value) {
        return Err(SkyError::validation(
            name,
            kind,
            "a hex-encoded string",
            format!("type 'string', value {value}"),
        ));
    }
    Ok(())
}

/// Decode a hex string into bytes, with the validation contract on failure.
pub fn hex_to_bytes(name: &str, value: &str, kind: &str) -> SkyResult<Vec<u8>> {
    validate_hex_string(name, value, kind)?;
    hex::decode(value).map_err(|_| {
        SkyError::validation(
            name,
            kind,
            "a hex-encoded string",
            format!("type 'string', value {value}"),
        )
    })
}

/// Check that a byte slice has exactly the expected length.
pub fn validate_byte_len(name: &str, value: &[u8], kind: &str, len: usize) -> SkyResult<()> {
    if value.len() != len {
        return Err(SkyError::validation(
            name,
            kind,
            format!("type 'bytes' of length {len}, was length {}", value.len()),
            format!("type 'bytes', value {}", hex::encode(value)),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex_string() {
        assert!(is_hex_string("deadbeef"));
        assert!(is_hex_string("00"));
        assert!(!is_hex_string(""));
        assert!(!is_hex_string("abc")); // odd length
        assert!(!is_hex_string("zzzz"));
    }

    #[test]
    fn test_validation_message_contract() {
        let err = validate_hex_string("publicKey", "foo", "parameter").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected 'parameter', 'publicKey', to be a hex-encoded string, was type 'string', value foo"
        );
    }

    #[test]
    fn test_byte_len_mismatch() {
        let err = validate_byte_len("data", &[1, 2, 3], "parameter", 34).unwrap_err();
        assert!(err.to_string().contains("length 34"));
        assert!(err.to_string().contains("was length 3"));
    }
}
