use std::fmt;

use super::SignerAlgorithm;

/// Raw signature bytes as returned by the key-management service.
/// For ECDSA the bytes are the ASN.1 DER encoded Ecdsa-Sig-Value; for RSA
/// and Ed25519 they are the fixed-length signature octets.
#[derive(Clone, Eq, PartialEq)]
pub struct CsrSignature {
    algo: SignerAlgorithm,
    bytes: Box<[u8]>,
}

impl CsrSignature {
    #[must_use]
    pub fn new(algo: SignerAlgorithm, bytes: Vec<u8>) -> Self {
        Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        }
    }
    #[must_use]
    pub fn algorithm(&self) -> SignerAlgorithm {
        self.algo
    }
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for CsrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CsrSignature(algo={}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}
