//! Key-management service port.
//!
//! The builder never sees private key material. Everything it needs from the
//! outside world goes through one of these two traits: fetching the public
//! half of a key, and asking the service to sign a message with it.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::domain::crypto::SignerAlgorithm;
use crate::domain::types::{KeyReference, MessageType};
use crate::infra::error::CsrResult;

/// Cryptographic operations a service key is provisioned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyUsageType {
    SignVerify,
    EncryptDecrypt,
    GenerateVerifyMac,
    KeyAgreement,
}

impl fmt::Display for KeyUsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyUsageType::SignVerify => "SIGN_VERIFY",
            KeyUsageType::EncryptDecrypt => "ENCRYPT_DECRYPT",
            KeyUsageType::GenerateVerifyMac => "GENERATE_VERIFY_MAC",
            KeyUsageType::KeyAgreement => "KEY_AGREEMENT",
        })
    }
}

/// Public key as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePublicKey {
    /// DER `SubjectPublicKeyInfo`.
    pub public_key_der: Vec<u8>,
    pub key_usage: KeyUsageType,
    /// Algorithms the service allows for this key, limited to the ones this
    /// crate knows. `None` when the service does not report them.
    pub signing_algorithms: Option<Vec<SignerAlgorithm>>,
}

/// A single signing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub key: KeyReference,
    /// Bytes to sign; a digest when `message_type` is `Digest`.
    pub message: Vec<u8>,
    pub message_type: MessageType,
    pub algorithm: SignerAlgorithm,
}

/// Blocking key-management service.
///
/// Implementations report a missing key as `KeyNotFound`, refusals as
/// `SignerRejected` and transport failures as `SignerUnavailable`. No retry
/// is expected at this layer.
pub trait KeyManagementService {
    /// Fetch the public half of `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the key does not exist or the service is unreachable.
    fn get_public_key(&self, key: &KeyReference) -> CsrResult<ServicePublicKey>;

    /// Sign `request.message` and return the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses or cannot be reached.
    fn sign(&self, request: &SignRequest) -> CsrResult<Vec<u8>>;
}

/// Async counterpart of [`KeyManagementService`].
pub trait AsyncKeyManagementService {
    /// Fetch the public half of `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the key does not exist or the service is unreachable.
    fn get_public_key(
        &self,
        key: &KeyReference,
    ) -> impl Future<Output = CsrResult<ServicePublicKey>> + Send;

    /// Sign `request.message` and return the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses or cannot be reached.
    fn sign(&self, request: &SignRequest) -> impl Future<Output = CsrResult<Vec<u8>>> + Send;
}

impl<T: KeyManagementService + ?Sized> KeyManagementService for &T {
    fn get_public_key(&self, key: &KeyReference) -> CsrResult<ServicePublicKey> {
        (**self).get_public_key(key)
    }

    fn sign(&self, request: &SignRequest) -> CsrResult<Vec<u8>> {
        (**self).sign(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_usage_wire_names() {
        let json = serde_json::to_string(&KeyUsageType::SignVerify).unwrap();
        assert_eq!(json, "\"SIGN_VERIFY\"");
        let back: KeyUsageType = serde_json::from_str("\"ENCRYPT_DECRYPT\"").unwrap();
        assert_eq!(back, KeyUsageType::EncryptDecrypt);
        assert_eq!(KeyUsageType::KeyAgreement.to_string(), "KEY_AGREEMENT");
    }
}
