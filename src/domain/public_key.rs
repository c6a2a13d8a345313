//! Public half of the externally held key.
//!
//! The service returns a DER `SubjectPublicKeyInfo`; it is embedded in the
//! request unchanged. The parsed form is only consulted to classify the key.

use std::fmt;

use const_oid::ObjectIdentifier;
use der::{Decode, Tag, Tagged};
use spki::SubjectPublicKeyInfoOwned;

use super::constants::{
    OID_CURVE_P256, OID_CURVE_P384, OID_CURVE_P521, OID_CURVE_SECP256K1, OID_CURVE_SM2,
    OID_EC_PUBLIC_KEY, OID_ED25519, OID_ED448, OID_RSA_ENCRYPTION,
};
use crate::infra::error::{CsrError, CsrResult};

/// Named curve of an EC key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Secp256k1,
    Sm2,
    Other(ObjectIdentifier),
}

impl EcCurve {
    fn from_oid(oid: ObjectIdentifier) -> Self {
        match oid {
            OID_CURVE_P256 => EcCurve::P256,
            OID_CURVE_P384 => EcCurve::P384,
            OID_CURVE_P521 => EcCurve::P521,
            OID_CURVE_SECP256K1 => EcCurve::Secp256k1,
            OID_CURVE_SM2 => EcCurve::Sm2,
            other => EcCurve::Other(other),
        }
    }
}

/// Key classification derived from the SPKI algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ec(EcCurve),
    Ed25519,
    Ed448,
    Unknown(ObjectIdentifier),
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Rsa => f.write_str("RSA"),
            KeyType::Ec(EcCurve::Other(oid)) => write!(f, "EC ({oid})"),
            KeyType::Ec(curve) => write!(f, "EC {curve:?}"),
            KeyType::Ed25519 => f.write_str("Ed25519"),
            KeyType::Ed448 => f.write_str("Ed448"),
            KeyType::Unknown(oid) => write!(f, "unknown ({oid})"),
        }
    }
}

/// `SubjectPublicKeyInfo` of the external key, kept as both DER and parsed.
#[derive(Clone)]
pub struct PublicKeyInfo {
    der: Box<[u8]>,
    spki: SubjectPublicKeyInfoOwned,
    key_type: KeyType,
}

impl PublicKeyInfo {
    /// Parse a DER `SubjectPublicKeyInfo` and classify its key.
    pub fn from_der(der: Vec<u8>) -> CsrResult<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(&der).map_err(|e| {
            CsrError::EncodingError(format!("public key is not a SubjectPublicKeyInfo: {e}"))
        })?;
        let key_type = classify(&spki);
        Ok(Self {
            der: der.into_boxed_slice(),
            spki,
            key_type,
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
    #[must_use]
    pub fn spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.spki
    }
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

impl fmt::Debug for PublicKeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKeyInfo(type={}, len={})",
            self.key_type,
            self.der.len()
        )
    }
}

fn classify(spki: &SubjectPublicKeyInfoOwned) -> KeyType {
    match spki.algorithm.oid {
        OID_RSA_ENCRYPTION => KeyType::Rsa,
        OID_ED25519 => KeyType::Ed25519,
        OID_ED448 => KeyType::Ed448,
        OID_EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .filter(|p| p.tag() == Tag::ObjectIdentifier)
                .and_then(|p| ObjectIdentifier::from_bytes(p.value()).ok());
            match curve {
                Some(oid) => KeyType::Ec(EcCurve::from_oid(oid)),
                None => KeyType::Unknown(OID_EC_PUBLIC_KEY),
            }
        }
        other => KeyType::Unknown(other),
    }
}
