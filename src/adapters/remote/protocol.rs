//! Protocol definitions for the remote key-management proxy.
//!
//! Binary payloads (public keys, messages, signatures) travel base64-encoded.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::adapters::backend::KeyUsageType;
use crate::domain::crypto::SignerAlgorithm;
use crate::domain::types::MessageType;

/// API version for protocol compatibility checks.
pub const PROTOCOL_VERSION: &str = "1.0";

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Request for the public half of a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPublicKeyRequest {
    pub version: String,
    pub key_id: String,
}

/// Public key of a key-management key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPublicKeyResponse {
    pub version: String,
    pub key_id: String,
    /// Base64-encoded DER `SubjectPublicKeyInfo`.
    pub public_key_b64: String,
    pub key_usage: KeyUsageType,
    /// Signing algorithms the key supports. Unknown names are kept as text
    /// and dropped when converting.
    #[serde(default)]
    pub signing_algorithms: Vec<String>,
}

/// Request to sign a message with a key-management key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageRequest {
    pub version: String,
    pub key_id: String,
    /// Base64-encoded message or digest.
    pub message_b64: String,
    pub message_type: MessageType,
    pub signing_algorithm: SignerAlgorithm,
    /// Optional nonce for replay protection (base64).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Signature produced by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageResponse {
    pub version: String,
    pub key_id: String,
    /// Base64-encoded signature bytes.
    pub signature_b64: String,
    pub signing_algorithm: SignerAlgorithm,
    /// Echo of the nonce if provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Error response from the proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub version: String,
    /// Error code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

/// Known error codes returned by the proxy.
pub mod error_codes {
    /// Authentication failed (bad token).
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const KEY_NOT_FOUND: &str = "KEY_NOT_FOUND";
    /// Key exists but is disabled or pending deletion.
    pub const KEY_UNAVAILABLE: &str = "KEY_UNAVAILABLE";
    pub const INVALID_KEY_USAGE: &str = "INVALID_KEY_USAGE";
    pub const UNSUPPORTED_ALGORITHM: &str = "UNSUPPORTED_ALGORITHM";
    pub const SIGNING_FAILED: &str = "SIGNING_FAILED";
    pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
}

impl GetPublicKeyRequest {
    #[must_use]
    pub fn new(key_id: &str) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            key_id: key_id.to_string(),
        }
    }
}

impl GetPublicKeyResponse {
    #[must_use]
    pub fn new(
        key_id: &str,
        public_key_der: &[u8],
        key_usage: KeyUsageType,
        signing_algorithms: &[SignerAlgorithm],
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            key_id: key_id.to_string(),
            public_key_b64: b64().encode(public_key_der),
            key_usage,
            signing_algorithms: signing_algorithms
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        }
    }

    /// Decode the public key from base64.
    ///
    /// # Errors
    /// Returns error if base64 decoding fails.
    pub fn decode_public_key(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64().decode(&self.public_key_b64)
    }

    /// Signing algorithms this crate knows, in the order reported.
    ///
    /// `None` when the service reports no list at all. A list of names this
    /// crate does not know yields `Some` of an empty vector.
    #[must_use]
    pub fn known_signing_algorithms(&self) -> Option<Vec<SignerAlgorithm>> {
        if self.signing_algorithms.is_empty() {
            return None;
        }
        Some(
            self.signing_algorithms
                .iter()
                .filter_map(|name| name.parse().ok())
                .collect(),
        )
    }
}

impl SignMessageRequest {
    #[must_use]
    pub fn new(
        key_id: &str,
        message: &[u8],
        message_type: MessageType,
        signing_algorithm: SignerAlgorithm,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            key_id: key_id.to_string(),
            message_b64: b64().encode(message),
            message_type,
            signing_algorithm,
            nonce: None,
        }
    }

    /// Add a nonce for replay protection.
    #[must_use]
    pub fn with_nonce(mut self) -> Self {
        let mut nonce_bytes = [0u8; 16];
        rand::fill(&mut nonce_bytes);
        self.nonce = Some(b64().encode(nonce_bytes));
        self
    }

    /// Decode the message from base64.
    ///
    /// # Errors
    /// Returns error if base64 decoding fails.
    pub fn decode_message(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64().decode(&self.message_b64)
    }
}

impl SignMessageResponse {
    #[must_use]
    pub fn new(
        key_id: &str,
        signature: &[u8],
        signing_algorithm: SignerAlgorithm,
        nonce: Option<String>,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            key_id: key_id.to_string(),
            signature_b64: b64().encode(signature),
            signing_algorithm,
            nonce,
        }
    }

    /// Decode the signature from base64.
    ///
    /// # Errors
    /// Returns error if base64 decoding fails.
    pub fn decode_signature(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64().decode(&self.signature_b64)
    }
}

impl ErrorResponse {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            error_code: code.into(),
            message: message.into(),
        }
    }
}
