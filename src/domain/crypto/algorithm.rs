//! Signing algorithm selectors.
//!
//! `SignerAlgorithm` names the algorithm exactly as the key-management service
//! spells it. `SignatureAlgorithmChoice` pairs it with the digest the caller
//! configured; the pair must agree and is never silently corrected.

use std::fmt;
use std::str::FromStr;

use der::asn1::Any;
use der::Sequence;
use serde::{Deserialize, Serialize};
use spki::AlgorithmIdentifierOwned;

use super::HashAlgorithm;
use crate::domain::constants::{
    OID_ECDSA_WITH_SHA256, OID_ECDSA_WITH_SHA384, OID_ECDSA_WITH_SHA512, OID_ED25519, OID_MGF1,
    OID_RSASSA_PSS, OID_SHA256_WITH_RSA, OID_SHA384_WITH_RSA, OID_SHA512_WITH_RSA,
};
use crate::domain::public_key::{EcCurve, KeyType};
use crate::domain::types::MessageType;
use crate::infra::error::{CsrError, CsrResult};

/// Signing algorithms understood by the key-management service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerAlgorithm {
    #[serde(rename = "RSASSA_PSS_SHA_256")]
    RsassaPssSha256,
    #[serde(rename = "RSASSA_PSS_SHA_384")]
    RsassaPssSha384,
    #[serde(rename = "RSASSA_PSS_SHA_512")]
    RsassaPssSha512,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_256")]
    RsassaPkcs1V15Sha256,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_384")]
    RsassaPkcs1V15Sha384,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_512")]
    RsassaPkcs1V15Sha512,
    #[serde(rename = "ECDSA_SHA_256")]
    EcdsaSha256,
    #[serde(rename = "ECDSA_SHA_384")]
    EcdsaSha384,
    #[serde(rename = "ECDSA_SHA_512")]
    EcdsaSha512,
    #[serde(rename = "ED25519_SHA_512")]
    Ed25519Sha512,
    /// Known to the service but never usable for a request built here.
    #[serde(rename = "SM2DSA")]
    Sm2Dsa,
}

/// Signature scheme family, used for key compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFamily {
    RsaPss,
    RsaPkcs1V15,
    Ecdsa,
    Ed25519,
    Sm2,
}

impl SignerAlgorithm {
    pub const ALL: [SignerAlgorithm; 11] = [
        SignerAlgorithm::RsassaPssSha256,
        SignerAlgorithm::RsassaPssSha384,
        SignerAlgorithm::RsassaPssSha512,
        SignerAlgorithm::RsassaPkcs1V15Sha256,
        SignerAlgorithm::RsassaPkcs1V15Sha384,
        SignerAlgorithm::RsassaPkcs1V15Sha512,
        SignerAlgorithm::EcdsaSha256,
        SignerAlgorithm::EcdsaSha384,
        SignerAlgorithm::EcdsaSha512,
        SignerAlgorithm::Ed25519Sha512,
        SignerAlgorithm::Sm2Dsa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignerAlgorithm::RsassaPssSha256 => "RSASSA_PSS_SHA_256",
            SignerAlgorithm::RsassaPssSha384 => "RSASSA_PSS_SHA_384",
            SignerAlgorithm::RsassaPssSha512 => "RSASSA_PSS_SHA_512",
            SignerAlgorithm::RsassaPkcs1V15Sha256 => "RSASSA_PKCS1_V1_5_SHA_256",
            SignerAlgorithm::RsassaPkcs1V15Sha384 => "RSASSA_PKCS1_V1_5_SHA_384",
            SignerAlgorithm::RsassaPkcs1V15Sha512 => "RSASSA_PKCS1_V1_5_SHA_512",
            SignerAlgorithm::EcdsaSha256 => "ECDSA_SHA_256",
            SignerAlgorithm::EcdsaSha384 => "ECDSA_SHA_384",
            SignerAlgorithm::EcdsaSha512 => "ECDSA_SHA_512",
            SignerAlgorithm::Ed25519Sha512 => "ED25519_SHA_512",
            SignerAlgorithm::Sm2Dsa => "SM2DSA",
        }
    }

    pub fn family(&self) -> SignatureFamily {
        match self {
            SignerAlgorithm::RsassaPssSha256
            | SignerAlgorithm::RsassaPssSha384
            | SignerAlgorithm::RsassaPssSha512 => SignatureFamily::RsaPss,
            SignerAlgorithm::RsassaPkcs1V15Sha256
            | SignerAlgorithm::RsassaPkcs1V15Sha384
            | SignerAlgorithm::RsassaPkcs1V15Sha512 => SignatureFamily::RsaPkcs1V15,
            SignerAlgorithm::EcdsaSha256
            | SignerAlgorithm::EcdsaSha384
            | SignerAlgorithm::EcdsaSha512 => SignatureFamily::Ecdsa,
            SignerAlgorithm::Ed25519Sha512 => SignatureFamily::Ed25519,
            SignerAlgorithm::Sm2Dsa => SignatureFamily::Sm2,
        }
    }

    /// Digest implied by the algorithm. SM2DSA uses SM3, which has no
    /// counterpart here.
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        match self {
            SignerAlgorithm::RsassaPssSha256
            | SignerAlgorithm::RsassaPkcs1V15Sha256
            | SignerAlgorithm::EcdsaSha256 => Some(HashAlgorithm::Sha256),
            SignerAlgorithm::RsassaPssSha384
            | SignerAlgorithm::RsassaPkcs1V15Sha384
            | SignerAlgorithm::EcdsaSha384 => Some(HashAlgorithm::Sha384),
            SignerAlgorithm::RsassaPssSha512
            | SignerAlgorithm::RsassaPkcs1V15Sha512
            | SignerAlgorithm::EcdsaSha512
            | SignerAlgorithm::Ed25519Sha512 => Some(HashAlgorithm::Sha512),
            SignerAlgorithm::Sm2Dsa => None,
        }
    }

    /// Whether a key of `key_type` can produce signatures with this algorithm.
    pub fn supports_key(&self, key_type: &KeyType) -> bool {
        match (self.family(), key_type) {
            (SignatureFamily::RsaPss | SignatureFamily::RsaPkcs1V15, KeyType::Rsa) => true,
            (SignatureFamily::Ecdsa, KeyType::Ec(curve)) => match curve {
                EcCurve::P256 | EcCurve::Secp256k1 => *self == SignerAlgorithm::EcdsaSha256,
                EcCurve::P384 => *self == SignerAlgorithm::EcdsaSha384,
                EcCurve::P521 => *self == SignerAlgorithm::EcdsaSha512,
                EcCurve::Sm2 | EcCurve::Other(_) => false,
            },
            (SignatureFamily::Ed25519, KeyType::Ed25519) => true,
            _ => false,
        }
    }

    /// Ed25519 signs the message itself; pre-hashing would change the scheme.
    pub fn supports_message_type(&self, message_type: MessageType) -> bool {
        !(message_type == MessageType::Digest && self.family() == SignatureFamily::Ed25519)
    }
}

impl fmt::Display for SignerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerAlgorithm {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        // Short aliases used by older configuration files.
        let canonical = match upper.as_str() {
            "RSA_SHA_256" => "RSASSA_PKCS1_V1_5_SHA_256",
            "RSA_SHA_384" => "RSASSA_PKCS1_V1_5_SHA_384",
            "RSA_SHA_512" => "RSASSA_PKCS1_V1_5_SHA_512",
            other => other,
        };
        SignerAlgorithm::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == canonical)
            .ok_or_else(|| CsrError::AlgorithmUnsupported {
                algorithm: s.to_string(),
                reason: "not a signing algorithm known to the key-management service".into(),
            })
    }
}

/// RSASSA-PSS-params (RFC 4055). The trailer field is left at its default.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct RsaPssParameters {
    #[asn1(context_specific = "0")]
    hash_algorithm: AlgorithmIdentifierOwned,
    #[asn1(context_specific = "1")]
    mask_gen_algorithm: AlgorithmIdentifierOwned,
    #[asn1(context_specific = "2")]
    salt_length: u32,
}

/// Digest plus signer algorithm selected for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAlgorithmChoice {
    hash: HashAlgorithm,
    signer: SignerAlgorithm,
}

impl SignatureAlgorithmChoice {
    /// Pair a digest with a signer algorithm. Consistency is checked by
    /// [`validate`](Self::validate), not here.
    pub fn new(hash: HashAlgorithm, signer: SignerAlgorithm) -> Self {
        Self { hash, signer }
    }

    /// Consistent pair derived from the signer algorithm alone.
    pub fn for_signer(signer: SignerAlgorithm) -> CsrResult<Self> {
        let choice = Self {
            hash: signer.hash_algorithm().unwrap_or(HashAlgorithm::Sha256),
            signer,
        };
        choice.validate()?;
        Ok(choice)
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn signer(&self) -> SignerAlgorithm {
        self.signer
    }

    /// Reject SM2 outright and any digest that disagrees with the signer
    /// algorithm's own digest.
    pub fn validate(&self) -> CsrResult<()> {
        let Some(implied) = self.signer.hash_algorithm() else {
            return Err(CsrError::AlgorithmUnsupported {
                algorithm: self.signer.to_string(),
                reason: "SM2 signatures are not supported for certification requests".into(),
            });
        };
        if implied != self.hash {
            return Err(CsrError::ConfigurationError(format!(
                "hash algorithm {} does not match signing algorithm {} (which implies {})",
                self.hash, self.signer, implied
            )));
        }
        Ok(())
    }

    /// `AlgorithmIdentifier` embedded in the final request.
    pub fn algorithm_identifier(&self) -> CsrResult<AlgorithmIdentifierOwned> {
        self.validate()?;
        let algid = match self.signer {
            SignerAlgorithm::RsassaPkcs1V15Sha256 => rsa_pkcs1(OID_SHA256_WITH_RSA),
            SignerAlgorithm::RsassaPkcs1V15Sha384 => rsa_pkcs1(OID_SHA384_WITH_RSA),
            SignerAlgorithm::RsassaPkcs1V15Sha512 => rsa_pkcs1(OID_SHA512_WITH_RSA),
            SignerAlgorithm::RsassaPssSha256
            | SignerAlgorithm::RsassaPssSha384
            | SignerAlgorithm::RsassaPssSha512 => rsa_pss(self.hash)?,
            SignerAlgorithm::EcdsaSha256 => absent(OID_ECDSA_WITH_SHA256),
            SignerAlgorithm::EcdsaSha384 => absent(OID_ECDSA_WITH_SHA384),
            SignerAlgorithm::EcdsaSha512 => absent(OID_ECDSA_WITH_SHA512),
            SignerAlgorithm::Ed25519Sha512 => absent(OID_ED25519),
            SignerAlgorithm::Sm2Dsa => {
                return Err(CsrError::AlgorithmUnsupported {
                    algorithm: self.signer.to_string(),
                    reason: "no identifier is defined for SM2 requests".into(),
                })
            }
        };
        Ok(algid)
    }
}

impl Default for SignatureAlgorithmChoice {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha256,
            signer: SignerAlgorithm::RsassaPssSha256,
        }
    }
}

fn absent(oid: const_oid::ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    }
}

fn rsa_pkcs1(oid: const_oid::ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: Some(Any::null()),
    }
}

fn rsa_pss(hash: HashAlgorithm) -> CsrResult<AlgorithmIdentifierOwned> {
    let hash_algorithm = absent(hash.oid());
    let params = RsaPssParameters {
        mask_gen_algorithm: AlgorithmIdentifierOwned {
            oid: OID_MGF1,
            parameters: Some(Any::encode_from(&hash_algorithm)?),
        },
        hash_algorithm,
        salt_length: hash.digest_size() as u32,
    };
    Ok(AlgorithmIdentifierOwned {
        oid: OID_RSASSA_PSS,
        parameters: Some(Any::encode_from(&params)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};

    #[test]
    fn names_round_trip_through_from_str() {
        for algo in SignerAlgorithm::ALL {
            assert_eq!(algo.as_str().parse::<SignerAlgorithm>().unwrap(), algo);
        }
        assert_eq!(
            "rsa_sha_256".parse::<SignerAlgorithm>().unwrap(),
            SignerAlgorithm::RsassaPkcs1V15Sha256
        );
        assert!(matches!(
            "DSA_SHA_1".parse::<SignerAlgorithm>(),
            Err(CsrError::AlgorithmUnsupported { .. })
        ));
    }

    #[test]
    fn serde_uses_service_names() {
        let json = serde_json::to_string(&SignerAlgorithm::EcdsaSha384).unwrap();
        assert_eq!(json, "\"ECDSA_SHA_384\"");
        let back: SignerAlgorithm = serde_json::from_str("\"RSASSA_PSS_SHA_512\"").unwrap();
        assert_eq!(back, SignerAlgorithm::RsassaPssSha512);
    }

    #[test]
    fn sm2_is_always_rejected() {
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
            let choice = SignatureAlgorithmChoice::new(hash, SignerAlgorithm::Sm2Dsa);
            assert!(matches!(
                choice.validate(),
                Err(CsrError::AlgorithmUnsupported { .. })
            ));
        }
        assert!(SignatureAlgorithmChoice::for_signer(SignerAlgorithm::Sm2Dsa).is_err());
    }

    #[test]
    fn mismatched_digest_is_configuration_error() {
        let choice =
            SignatureAlgorithmChoice::new(HashAlgorithm::Sha1, SignerAlgorithm::RsassaPssSha256);
        assert!(matches!(
            choice.validate(),
            Err(CsrError::ConfigurationError(_))
        ));
        let choice =
            SignatureAlgorithmChoice::new(HashAlgorithm::Sha256, SignerAlgorithm::Ed25519Sha512);
        assert!(choice.validate().is_err());
    }

    #[test]
    fn key_compatibility() {
        assert!(SignerAlgorithm::RsassaPssSha384.supports_key(&KeyType::Rsa));
        assert!(!SignerAlgorithm::EcdsaSha256.supports_key(&KeyType::Rsa));
        assert!(SignerAlgorithm::EcdsaSha256.supports_key(&KeyType::Ec(EcCurve::P256)));
        assert!(SignerAlgorithm::EcdsaSha256.supports_key(&KeyType::Ec(EcCurve::Secp256k1)));
        assert!(!SignerAlgorithm::EcdsaSha256.supports_key(&KeyType::Ec(EcCurve::P384)));
        assert!(SignerAlgorithm::EcdsaSha512.supports_key(&KeyType::Ec(EcCurve::P521)));
        assert!(!SignerAlgorithm::EcdsaSha256.supports_key(&KeyType::Ec(EcCurve::Sm2)));
        assert!(SignerAlgorithm::Ed25519Sha512.supports_key(&KeyType::Ed25519));
        assert!(!SignerAlgorithm::Ed25519Sha512.supports_key(&KeyType::Ed448));
    }

    #[test]
    fn ed25519_rejects_digest_mode() {
        assert!(!SignerAlgorithm::Ed25519Sha512.supports_message_type(MessageType::Digest));
        assert!(SignerAlgorithm::Ed25519Sha512.supports_message_type(MessageType::Raw));
        assert!(SignerAlgorithm::EcdsaSha256.supports_message_type(MessageType::Digest));
    }

    #[test]
    fn pkcs1_identifier_has_null_parameters() {
        let choice = SignatureAlgorithmChoice::for_signer(SignerAlgorithm::RsassaPkcs1V15Sha256)
            .unwrap();
        let algid = choice.algorithm_identifier().unwrap();
        assert_eq!(algid.oid, OID_SHA256_WITH_RSA);
        assert_eq!(algid.parameters, Some(Any::null()));
    }

    #[test]
    fn ecdsa_identifier_has_absent_parameters() {
        let choice = SignatureAlgorithmChoice::for_signer(SignerAlgorithm::EcdsaSha384).unwrap();
        let algid = choice.algorithm_identifier().unwrap();
        assert_eq!(algid.oid, OID_ECDSA_WITH_SHA384);
        assert!(algid.parameters.is_none());
    }

    #[test]
    fn pss_identifier_carries_hash_mgf_and_salt() {
        let choice =
            SignatureAlgorithmChoice::for_signer(SignerAlgorithm::RsassaPssSha384).unwrap();
        let algid = choice.algorithm_identifier().unwrap();
        assert_eq!(algid.oid, OID_RSASSA_PSS);

        let params_der = algid.parameters.unwrap().to_der().unwrap();
        let params = RsaPssParameters::from_der(&params_der).unwrap();
        assert_eq!(params.hash_algorithm.oid, HashAlgorithm::Sha384.oid());
        assert_eq!(params.mask_gen_algorithm.oid, OID_MGF1);
        assert_eq!(params.salt_length, 48);
    }
}
