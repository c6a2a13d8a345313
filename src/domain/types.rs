//! Type-safe wrappers using new-type pattern
//!
//! Wrappers for inputs that cross the key-management service boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::infra::error::{CsrError, CsrResult};

/// Longest key identifier accepted (matches the KMS `KeyId` limit).
const MAX_KEY_REFERENCE_LEN: usize = 2048;

/// Opaque identifier of an asymmetric key held by the key-management service.
///
/// Accepts key ids, key ARNs, alias names and alias ARNs. The value is never
/// interpreted locally beyond basic shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyReference(String);

impl KeyReference {
    /// Create a new `KeyReference` after validation
    pub fn new(key_ref: impl AsRef<str>) -> CsrResult<Self> {
        let key_ref = key_ref.as_ref();
        Self::validate(key_ref)?;
        Ok(KeyReference(key_ref.to_string()))
    }

    /// Get the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(key_ref: &str) -> CsrResult<()> {
        if key_ref.trim().is_empty() {
            return Err(CsrError::ConfigurationError(
                "key reference must not be empty".to_string(),
            ));
        }
        if key_ref.len() > MAX_KEY_REFERENCE_LEN {
            return Err(CsrError::ConfigurationError(format!(
                "key reference too long: {} characters (maximum {MAX_KEY_REFERENCE_LEN})",
                key_ref.len()
            )));
        }
        if key_ref.chars().any(char::is_whitespace) {
            return Err(CsrError::ConfigurationError(format!(
                "key reference must not contain whitespace: {key_ref:?}"
            )));
        }
        Ok(())
    }
}

impl FromStr for KeyReference {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for KeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the signed payload is handed to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// The DER bytes themselves; the service applies the digest.
    #[default]
    Raw,
    /// A digest computed locally with the chosen hash algorithm.
    Digest,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Raw => "RAW",
            MessageType::Digest => "DIGEST",
        }
    }
}

impl FromStr for MessageType {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RAW" => Ok(MessageType::Raw),
            "DIGEST" => Ok(MessageType::Digest),
            _ => Err(CsrError::ConfigurationError(format!(
                "message type must be RAW or DIGEST, not {s:?}"
            ))),
        }
    }
}
