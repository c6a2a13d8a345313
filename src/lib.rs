//! KMS CSR Builder Library
//!
//! Builds PKCS#10 certification requests (RFC 2986) whose signature is
//! produced by an external key-management service. The private key never
//! leaves the service: the library assembles the `CertificationRequestInfo`,
//! hands its DER encoding to the service, and wraps the returned signature
//! into the final `CertificationRequest`.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use adapters::backend::{
    AsyncKeyManagementService, KeyManagementService, KeyUsageType, ServicePublicKey, SignRequest,
};
pub use domain::crypto::{CsrSignature, SignatureAlgorithmChoice, SignerAlgorithm};
pub use domain::extensions::{
    CriticalityPolicy, ExtendedKeyUsagePurpose, ExtensionRequest, ExtensionSet, ExtensionValue,
    KeyUsageFlag,
};
pub use domain::name::{build_name, NameAttribute, SubjectInput, SubjectName};
pub use domain::public_key::{EcCurve, KeyType, PublicKeyInfo};
pub use domain::request::CertificationRequest;
pub use domain::types::{KeyReference, MessageType};
pub use infra::error::{CsrError, CsrResult};
pub use pipelines::build::CsrBuilder;
pub use services::pem::{decode_csr_pem, pem_armor_csr, read_csr};

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Digest algorithm OID as used in `AlgorithmIdentifier` structures.
    pub fn oid(&self) -> ObjectIdentifier {
        use domain::constants;
        match self {
            HashAlgorithm::Sha1 => constants::OID_SHA1,
            HashAlgorithm::Sha256 => constants::OID_SHA256,
            HashAlgorithm::Sha384 => constants::OID_SHA384,
            HashAlgorithm::Sha512 => constants::OID_SHA512,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(CsrError::ConfigurationError(format!(
                "hash algorithm must be one of sha1, sha256, sha384, sha512, not {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_properties() {
        assert_eq!(HashAlgorithm::Sha1.as_str(), "sha1");
        assert_eq!(HashAlgorithm::Sha1.digest_size(), 20);

        assert_eq!(HashAlgorithm::Sha256.as_str(), "sha256");
        assert_eq!(HashAlgorithm::Sha256.digest_size(), 32);

        assert_eq!(HashAlgorithm::Sha512.as_str(), "sha512");
        assert_eq!(HashAlgorithm::Sha512.digest_size(), 64);
    }

    #[test]
    fn test_hash_algorithm_parsing() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_hash_algorithm_oids() {
        assert_eq!(
            HashAlgorithm::Sha256.oid().to_string(),
            "2.16.840.1.101.3.4.2.1"
        );
        assert_eq!(HashAlgorithm::Sha1.oid().to_string(), "1.3.14.3.2.26");
    }
}
