//! In-memory key-management service that records every call.

use std::sync::Mutex;

use kms_csr_builder::{
    AsyncKeyManagementService, CsrError, CsrResult, KeyManagementService, KeyReference,
    KeyUsageType, ServicePublicKey, SignRequest, SignerAlgorithm,
};

use super::fixtures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPublicKey(KeyReference),
    Sign(SignRequest),
}

pub struct StubKms {
    public_key: ServicePublicKey,
    signature: Vec<u8>,
    missing_key: bool,
    calls: Mutex<Vec<Call>>,
}

impl StubKms {
    pub fn with_public_key(public_key_der: Vec<u8>) -> Self {
        Self {
            public_key: ServicePublicKey {
                public_key_der,
                key_usage: KeyUsageType::SignVerify,
                signing_algorithms: None,
            },
            signature: Self::fixed_signature(),
            missing_key: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// RSA 2048 signing key that reports no algorithm list.
    pub fn rsa() -> Self {
        Self::with_public_key(fixtures::rsa_2048_spki())
    }

    pub fn ec_p256() -> Self {
        Self::with_public_key(fixtures::ec_p256_spki())
    }

    /// Every call for a key fails with `KeyNotFound`.
    pub fn missing_key(mut self) -> Self {
        self.missing_key = true;
        self
    }

    pub fn with_key_usage(mut self, usage: KeyUsageType) -> Self {
        self.public_key.key_usage = usage;
        self
    }

    pub fn with_signing_algorithms(mut self, algorithms: Vec<SignerAlgorithm>) -> Self {
        self.public_key.signing_algorithms = Some(algorithms);
        self
    }

    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    /// The 256 bytes returned by every successful `sign`.
    pub fn fixed_signature() -> Vec<u8> {
        (0..=255u8).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sign_requests(&self) -> Vec<SignRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Sign(request) => Some(request),
                Call::GetPublicKey(_) => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, key: &KeyReference) -> CsrResult<()> {
        if self.missing_key {
            Err(CsrError::KeyNotFound(key.to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyManagementService for StubKms {
    fn get_public_key(&self, key: &KeyReference) -> CsrResult<ServicePublicKey> {
        self.record(Call::GetPublicKey(key.clone()));
        self.lookup(key)?;
        Ok(self.public_key.clone())
    }

    fn sign(&self, request: &SignRequest) -> CsrResult<Vec<u8>> {
        self.record(Call::Sign(request.clone()));
        self.lookup(&request.key)?;
        Ok(self.signature.clone())
    }
}

impl AsyncKeyManagementService for StubKms {
    async fn get_public_key(&self, key: &KeyReference) -> CsrResult<ServicePublicKey> {
        tokio::task::yield_now().await;
        KeyManagementService::get_public_key(self, key)
    }

    async fn sign(&self, request: &SignRequest) -> CsrResult<Vec<u8>> {
        tokio::task::yield_now().await;
        KeyManagementService::sign(self, request)
    }
}
