//! Error types for certification request building.
//!
//! Configuration errors are raised before any call to the key-management
//! service. Signer-stage errors carry the key reference and algorithm so the
//! caller can decide whether to retry.

use thiserror::Error;

/// Result type for request building operations
pub type CsrResult<T> = Result<T, CsrError>;

/// Error kinds surfaced by the builder
#[derive(Error, Debug, miette::Diagnostic)]
pub enum CsrError {
    #[error("Invalid subject attribute '{key}': {reason}")]
    #[diagnostic(code(csr::invalid_attribute))]
    InvalidAttribute { key: String, reason: String },

    #[error("Unknown extension OID: {0}")]
    #[diagnostic(
        code(csr::unknown_extension_oid),
        help("supply the value as an opaque extension to bypass structural validation")
    )]
    UnknownExtensionOid(String),

    #[error("Malformed value for extension {oid}: {reason}")]
    #[diagnostic(code(csr::malformed_extension_value))]
    MalformedExtensionValue { oid: String, reason: String },

    #[error("Signing algorithm {algorithm} is not supported: {reason}")]
    #[diagnostic(code(csr::algorithm_unsupported))]
    AlgorithmUnsupported { algorithm: String, reason: String },

    #[error("Key not found: {0}")]
    #[diagnostic(code(csr::key_not_found))]
    KeyNotFound(String),

    #[error("Key {key_ref} cannot be used: {reason}")]
    #[diagnostic(code(csr::key_type_unsupported))]
    KeyTypeUnsupported { key_ref: String, reason: String },

    #[error("Signer rejected request for key {key_ref} with {algorithm}: {reason}")]
    #[diagnostic(code(csr::signer_rejected))]
    SignerRejected {
        key_ref: String,
        algorithm: String,
        reason: String,
    },

    #[error("Signer unavailable for key {key_ref}: {reason}")]
    #[diagnostic(code(csr::signer_unavailable), help("the request can be retried"))]
    SignerUnavailable { key_ref: String, reason: String },

    #[error("ASN.1 encoding error: {0}")]
    #[diagnostic(code(csr::encoding))]
    EncodingError(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(csr::configuration))]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(csr::io))]
    IoError(String),
}

impl CsrError {
    /// True for failures that happened at or after the external service
    /// boundary (and may therefore be transient).
    #[must_use]
    pub fn is_signer_stage(&self) -> bool {
        matches!(
            self,
            CsrError::KeyNotFound(_)
                | CsrError::KeyTypeUnsupported { .. }
                | CsrError::SignerRejected { .. }
                | CsrError::SignerUnavailable { .. }
        )
    }
}

impl From<der::Error> for CsrError {
    fn from(error: der::Error) -> Self {
        CsrError::EncodingError(error.to_string())
    }
}

impl From<std::io::Error> for CsrError {
    fn from(error: std::io::Error) -> Self {
        CsrError::IoError(error.to_string())
    }
}
