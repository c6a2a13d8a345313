//! Retrieves the public half of the external key and checks it can sign the
//! request with the configured algorithm.

use crate::adapters::backend::{
    AsyncKeyManagementService, KeyManagementService, KeyUsageType, ServicePublicKey,
};
use crate::domain::crypto::SignatureAlgorithmChoice;
use crate::domain::public_key::{EcCurve, KeyType, PublicKeyInfo};
use crate::domain::types::KeyReference;
use crate::infra::error::{CsrError, CsrResult};

/// One fetch per build; nothing is cached across calls.
pub struct PublicKeyAdapter {
    choice: SignatureAlgorithmChoice,
}

impl PublicKeyAdapter {
    #[must_use]
    pub fn new(choice: SignatureAlgorithmChoice) -> Self {
        Self { choice }
    }

    /// Fetch and check the public key of `key`.
    ///
    /// # Errors
    /// `KeyNotFound` / `SignerUnavailable` from the service, `KeyTypeUnsupported`
    /// for keys that cannot sign, `AlgorithmUnsupported` when the configured
    /// algorithm does not fit the key.
    pub fn fetch<S>(&self, service: &S, key: &KeyReference) -> CsrResult<PublicKeyInfo>
    where
        S: KeyManagementService + ?Sized,
    {
        log::debug!("Fetching public key for {key}");
        let reported = service.get_public_key(key)?;
        self.accept(key, reported)
    }

    /// Async variant of [`fetch`](Self::fetch).
    ///
    /// # Errors
    /// Same as [`fetch`](Self::fetch).
    pub async fn fetch_async<S>(&self, service: &S, key: &KeyReference) -> CsrResult<PublicKeyInfo>
    where
        S: AsyncKeyManagementService + ?Sized,
    {
        log::debug!("Fetching public key for {key}");
        let reported = service.get_public_key(key).await?;
        self.accept(key, reported)
    }

    /// Check a public key as reported by the service.
    ///
    /// # Errors
    /// See [`fetch`](Self::fetch).
    pub fn accept(&self, key: &KeyReference, reported: ServicePublicKey) -> CsrResult<PublicKeyInfo> {
        let unsupported = |reason: String| CsrError::KeyTypeUnsupported {
            key_ref: key.to_string(),
            reason,
        };

        if reported.key_usage != KeyUsageType::SignVerify {
            return Err(unsupported(format!(
                "key usage is {}, SIGN_VERIFY is required",
                reported.key_usage
            )));
        }

        let info = PublicKeyInfo::from_der(reported.public_key_der)
            .map_err(|e| unsupported(e.to_string()))?;
        let key_type = info.key_type();
        if !is_signing_key_type(&key_type) {
            return Err(unsupported(format!("{key_type} keys cannot sign requests")));
        }

        let signer = self.choice.signer();
        if !signer.supports_key(&key_type) {
            return Err(CsrError::AlgorithmUnsupported {
                algorithm: signer.to_string(),
                reason: format!("not usable with the {key_type} key {key}"),
            });
        }
        if let Some(offered) = &reported.signing_algorithms {
            if !offered.contains(&signer) {
                let reason = if offered.is_empty() {
                    format!("key {key} supports no algorithm known to this tool")
                } else {
                    let names: Vec<&str> = offered.iter().map(|a| a.as_str()).collect();
                    format!("key {key} only supports {}", names.join(", "))
                };
                return Err(CsrError::AlgorithmUnsupported {
                    algorithm: signer.to_string(),
                    reason,
                });
            }
        }

        log::info!("Using {key_type} public key of {key}");
        Ok(info)
    }
}

fn is_signing_key_type(key_type: &KeyType) -> bool {
    matches!(
        key_type,
        KeyType::Rsa
            | KeyType::Ed25519
            | KeyType::Ec(EcCurve::P256 | EcCurve::P384 | EcCurve::P521 | EcCurve::Secp256k1)
    )
}
