//! Public key fixtures.
//!
//! The builder only parses and re-embeds a `SubjectPublicKeyInfo`, so the
//! keys here are well-formed encodings with deterministic filler rather than
//! real key pairs.

use der::asn1::{BitString, Uint};
use der::{Any, Encode, Sequence};
use kms_csr_builder::domain::constants::{
    OID_CURVE_P256, OID_CURVE_SM2, OID_EC_PUBLIC_KEY, OID_ED25519, OID_RSA_ENCRYPTION,
};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct RsaPublicKey {
    modulus: Uint,
    public_exponent: Uint,
}

fn filler(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed))
        .collect()
}

fn spki(algorithm: ObjectIdentifier, parameters: Option<Any>, key: &[u8]) -> Vec<u8> {
    SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: algorithm,
            parameters,
        },
        subject_public_key: BitString::from_bytes(key).unwrap(),
    }
    .to_der()
    .unwrap()
}

/// 2048-bit RSA public key, exponent 65537.
pub fn rsa_2048_spki() -> Vec<u8> {
    let mut modulus = filler(256, 0x5b);
    modulus[0] = 0xc3;
    let key = RsaPublicKey {
        modulus: Uint::new(&modulus).unwrap(),
        public_exponent: Uint::new(&[0x01, 0x00, 0x01]).unwrap(),
    };
    spki(OID_RSA_ENCRYPTION, Some(Any::null()), &key.to_der().unwrap())
}

fn ec_spki(curve: ObjectIdentifier) -> Vec<u8> {
    let mut point = vec![0x04];
    point.extend(filler(64, 0x11));
    spki(
        OID_EC_PUBLIC_KEY,
        Some(Any::encode_from(&curve).unwrap()),
        &point,
    )
}

/// Uncompressed NIST P-256 public key.
pub fn ec_p256_spki() -> Vec<u8> {
    ec_spki(OID_CURVE_P256)
}

/// EC key on the SM2 curve.
pub fn sm2_spki() -> Vec<u8> {
    ec_spki(OID_CURVE_SM2)
}

pub fn ed25519_spki() -> Vec<u8> {
    spki(OID_ED25519, None, &filler(32, 0x42))
}
