//! Remote key-management client.
//!
//! Implements [`AsyncKeyManagementService`] against a proxy speaking the
//! JSON protocol in [`super::protocol`].

use super::protocol::{
    error_codes, ErrorResponse, GetPublicKeyRequest, GetPublicKeyResponse, SignMessageRequest,
    SignMessageResponse,
};
use crate::adapters::backend::{AsyncKeyManagementService, ServicePublicKey, SignRequest};
use crate::domain::types::KeyReference;
use crate::infra::error::{CsrError, CsrResult};

/// Configuration for connecting to a remote key-management proxy.
#[derive(Debug, Clone)]
pub struct RemoteKmsConfig {
    /// Base URL of the proxy (e.g., `https://kms-proxy.example.com`).
    pub base_url: String,
    /// Bearer token for authentication.
    pub auth_token: String,
    pub timeout_secs: u64,
    /// Whether to verify TLS certificates (should be true in production).
    pub verify_tls: bool,
}

impl RemoteKmsConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            timeout_secs: 30,
            verify_tls: true,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Disable TLS verification (for testing only!).
    #[must_use]
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }
}

/// HTTP client for the remote key-management proxy.
pub struct RemoteKmsClient {
    config: RemoteKmsConfig,
    client: reqwest::Client,
}

/// Which call an error belongs to, for error mapping.
struct CallContext<'a> {
    key: &'a KeyReference,
    algorithm: Option<String>,
}

impl RemoteKmsClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: RemoteKmsConfig) -> CsrResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| {
                CsrError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn post<Req, Resp>(
        &self,
        path: &str,
        request: &Req,
        ctx: &CallContext<'_>,
    ) -> CsrResult<Resp>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        log::debug!("POST {url} for key {}", ctx.key);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.auth_token),
            )
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CsrError::SignerUnavailable {
                key_ref: ctx.key.to_string(),
                reason: format!("Failed to connect to proxy: {e}"),
            })?;

        Self::handle_response(response, ctx).await
    }

    /// Handle HTTP response and parse JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        ctx: &CallContext<'_>,
    ) -> CsrResult<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| CsrError::SignerUnavailable {
                key_ref: ctx.key.to_string(),
                reason: format!("Failed to parse response: {e}"),
            });
        }

        let error_text = response.text().await.unwrap_or_default();
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
            Err(Self::map_error_code(&error_response, ctx))
        } else if status.is_server_error() {
            Err(CsrError::SignerUnavailable {
                key_ref: ctx.key.to_string(),
                reason: format!("Server error {status}: {error_text}"),
            })
        } else {
            Err(CsrError::SignerRejected {
                key_ref: ctx.key.to_string(),
                algorithm: ctx.algorithm.clone().unwrap_or_default(),
                reason: format!("HTTP {status}: {error_text}"),
            })
        }
    }

    /// Map proxy error codes to `CsrError` variants.
    fn map_error_code(error: &ErrorResponse, ctx: &CallContext<'_>) -> CsrError {
        let key_ref = ctx.key.to_string();
        let algorithm = ctx.algorithm.clone().unwrap_or_default();
        match error.error_code.as_str() {
            error_codes::KEY_NOT_FOUND => CsrError::KeyNotFound(key_ref),
            error_codes::INVALID_KEY_USAGE => CsrError::KeyTypeUnsupported {
                key_ref,
                reason: error.message.clone(),
            },
            error_codes::UNSUPPORTED_ALGORITHM => CsrError::AlgorithmUnsupported {
                algorithm,
                reason: error.message.clone(),
            },
            error_codes::KEY_UNAVAILABLE | error_codes::RATE_LIMITED => {
                CsrError::SignerUnavailable {
                    key_ref,
                    reason: format!("[{}] {}", error.error_code, error.message),
                }
            }
            _ => CsrError::SignerRejected {
                key_ref,
                algorithm,
                reason: format!("[{}] {}", error.error_code, error.message),
            },
        }
    }
}

impl AsyncKeyManagementService for RemoteKmsClient {
    async fn get_public_key(&self, key: &KeyReference) -> CsrResult<ServicePublicKey> {
        let ctx = CallContext {
            key,
            algorithm: None,
        };
        let request = GetPublicKeyRequest::new(key.as_str());
        let response: GetPublicKeyResponse = self.post("/api/v1/public-key", &request, &ctx).await?;

        let public_key_der =
            response
                .decode_public_key()
                .map_err(|e| CsrError::SignerUnavailable {
                    key_ref: key.to_string(),
                    reason: format!("Failed to decode public key: {e}"),
                })?;

        Ok(ServicePublicKey {
            public_key_der,
            key_usage: response.key_usage,
            signing_algorithms: response.known_signing_algorithms(),
        })
    }

    async fn sign(&self, request: &SignRequest) -> CsrResult<Vec<u8>> {
        let ctx = CallContext {
            key: &request.key,
            algorithm: Some(request.algorithm.to_string()),
        };
        let wire = SignMessageRequest::new(
            request.key.as_str(),
            &request.message,
            request.message_type,
            request.algorithm,
        )
        .with_nonce();

        let response: SignMessageResponse = self.post("/api/v1/sign", &wire, &ctx).await?;

        let rejected = |reason: String| CsrError::SignerRejected {
            key_ref: request.key.to_string(),
            algorithm: request.algorithm.to_string(),
            reason,
        };
        if response.nonce != wire.nonce {
            return Err(rejected("nonce in response does not match request".into()));
        }
        if response.signing_algorithm != request.algorithm {
            return Err(rejected(format!(
                "service signed with {} instead",
                response.signing_algorithm
            )));
        }
        response
            .decode_signature()
            .map_err(|e| rejected(format!("Failed to decode signature: {e}")))
    }
}
