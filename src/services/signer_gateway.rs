//! Hands the encoded request info to the key-management service for signing.

use crate::adapters::backend::{AsyncKeyManagementService, KeyManagementService, SignRequest};
use crate::domain::constants::MAX_RAW_MESSAGE_LEN;
use crate::domain::crypto::{compute_digest, CsrSignature, SignatureAlgorithmChoice};
use crate::domain::types::{KeyReference, MessageType};
use crate::infra::error::{CsrError, CsrResult};

pub struct SignerGateway {
    choice: SignatureAlgorithmChoice,
    message_type: MessageType,
}

impl SignerGateway {
    #[must_use]
    pub fn new(choice: SignatureAlgorithmChoice, message_type: MessageType) -> Self {
        Self {
            choice,
            message_type,
        }
    }

    /// Check the algorithm selection without contacting the service.
    ///
    /// # Errors
    /// `AlgorithmUnsupported` for SM2 or a message type the algorithm cannot
    /// use; `ConfigurationError` for a digest that does not match.
    pub fn validate(&self) -> CsrResult<()> {
        self.choice.validate()?;
        let signer = self.choice.signer();
        if !signer.supports_message_type(self.message_type) {
            return Err(CsrError::AlgorithmUnsupported {
                algorithm: signer.to_string(),
                reason: format!("{} messages are not supported", self.message_type.as_str()),
            });
        }
        Ok(())
    }

    /// Build the service request for `payload`.
    ///
    /// In RAW mode the payload is sent as-is and the service hashes it with
    /// the algorithm's digest. In DIGEST mode it is hashed here.
    ///
    /// # Errors
    /// See [`validate`](Self::validate); `SignerRejected` when a RAW payload
    /// exceeds the service limit.
    pub fn prepare(&self, key: &KeyReference, payload: &[u8]) -> CsrResult<SignRequest> {
        self.validate()?;
        let message = match self.message_type {
            MessageType::Raw => {
                if payload.len() > MAX_RAW_MESSAGE_LEN {
                    return Err(CsrError::SignerRejected {
                        key_ref: key.to_string(),
                        algorithm: self.choice.signer().to_string(),
                        reason: format!(
                            "{} byte message exceeds the {MAX_RAW_MESSAGE_LEN} byte RAW limit; use DIGEST",
                            payload.len()
                        ),
                    });
                }
                payload.to_vec()
            }
            MessageType::Digest => {
                let digest = compute_digest(self.choice.hash(), payload);
                log::debug!(
                    "{} digest of request info: {}",
                    self.choice.hash(),
                    hex::encode(&digest)
                );
                digest
            }
        };
        Ok(SignRequest {
            key: key.clone(),
            message,
            message_type: self.message_type,
            algorithm: self.choice.signer(),
        })
    }

    /// Sign `payload` with `key`.
    ///
    /// # Errors
    /// Errors from [`prepare`](Self::prepare) or the service, plus
    /// `SignerRejected` for an empty signature.
    pub fn sign<S>(&self, service: &S, key: &KeyReference, payload: &[u8]) -> CsrResult<CsrSignature>
    where
        S: KeyManagementService + ?Sized,
    {
        let request = self.prepare(key, payload)?;
        log::info!(
            "Requesting {} signature from key {key} ({} message, {} bytes)",
            request.algorithm,
            request.message_type.as_str(),
            request.message.len()
        );
        let signature = service.sign(&request)?;
        self.accept(key, signature)
    }

    /// Async variant of [`sign`](Self::sign).
    ///
    /// # Errors
    /// Same as [`sign`](Self::sign).
    pub async fn sign_async<S>(
        &self,
        service: &S,
        key: &KeyReference,
        payload: &[u8],
    ) -> CsrResult<CsrSignature>
    where
        S: AsyncKeyManagementService + ?Sized,
    {
        let request = self.prepare(key, payload)?;
        log::info!(
            "Requesting {} signature from key {key} ({} message, {} bytes)",
            request.algorithm,
            request.message_type.as_str(),
            request.message.len()
        );
        let signature = service.sign(&request).await?;
        self.accept(key, signature)
    }

    fn accept(&self, key: &KeyReference, signature: Vec<u8>) -> CsrResult<CsrSignature> {
        if signature.is_empty() {
            return Err(CsrError::SignerRejected {
                key_ref: key.to_string(),
                algorithm: self.choice.signer().to_string(),
                reason: "service returned an empty signature".into(),
            });
        }
        log::debug!("Received {} byte signature", signature.len());
        Ok(CsrSignature::new(self.choice.signer(), signature))
    }
}
