use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::flagset::FlagSet;
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::KeyUsages;

use crate::infra::error::CsrError;

/// Key usage bits, named as in RFC 5280 section 4.2.1.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsageFlag {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsageFlag {
    pub const ALL: [KeyUsageFlag; 9] = [
        KeyUsageFlag::DigitalSignature,
        KeyUsageFlag::NonRepudiation,
        KeyUsageFlag::KeyEncipherment,
        KeyUsageFlag::DataEncipherment,
        KeyUsageFlag::KeyAgreement,
        KeyUsageFlag::KeyCertSign,
        KeyUsageFlag::CrlSign,
        KeyUsageFlag::EncipherOnly,
        KeyUsageFlag::DecipherOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUsageFlag::DigitalSignature => "digital_signature",
            KeyUsageFlag::NonRepudiation => "non_repudiation",
            KeyUsageFlag::KeyEncipherment => "key_encipherment",
            KeyUsageFlag::DataEncipherment => "data_encipherment",
            KeyUsageFlag::KeyAgreement => "key_agreement",
            KeyUsageFlag::KeyCertSign => "key_cert_sign",
            KeyUsageFlag::CrlSign => "crl_sign",
            KeyUsageFlag::EncipherOnly => "encipher_only",
            KeyUsageFlag::DecipherOnly => "decipher_only",
        }
    }

    pub(crate) fn to_x509(self) -> KeyUsages {
        match self {
            KeyUsageFlag::DigitalSignature => KeyUsages::DigitalSignature,
            KeyUsageFlag::NonRepudiation => KeyUsages::NonRepudiation,
            KeyUsageFlag::KeyEncipherment => KeyUsages::KeyEncipherment,
            KeyUsageFlag::DataEncipherment => KeyUsages::DataEncipherment,
            KeyUsageFlag::KeyAgreement => KeyUsages::KeyAgreement,
            KeyUsageFlag::KeyCertSign => KeyUsages::KeyCertSign,
            KeyUsageFlag::CrlSign => KeyUsages::CRLSign,
            KeyUsageFlag::EncipherOnly => KeyUsages::EncipherOnly,
            KeyUsageFlag::DecipherOnly => KeyUsages::DecipherOnly,
        }
    }

    /// Flags present in an X.509 key usage bit set.
    pub(crate) fn from_x509(bits: FlagSet<KeyUsages>) -> Vec<KeyUsageFlag> {
        KeyUsageFlag::ALL
            .into_iter()
            .filter(|flag| bits.contains(flag.to_x509()))
            .collect()
    }
}

impl fmt::Display for KeyUsageFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyUsageFlag {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyUsageFlag::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CsrError::ConfigurationError(format!("unknown key usage {s:?}")))
    }
}

/// Extended key usage purpose, identified by OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtendedKeyUsagePurpose(ObjectIdentifier);

const NAMED_PURPOSES: [(&str, ExtendedKeyUsagePurpose); 10] = [
    ("server_auth", ExtendedKeyUsagePurpose::SERVER_AUTH),
    ("client_auth", ExtendedKeyUsagePurpose::CLIENT_AUTH),
    ("code_signing", ExtendedKeyUsagePurpose::CODE_SIGNING),
    ("email_protection", ExtendedKeyUsagePurpose::EMAIL_PROTECTION),
    ("ipsec_end_system", ExtendedKeyUsagePurpose::IPSEC_END_SYSTEM),
    ("ipsec_tunnel", ExtendedKeyUsagePurpose::IPSEC_TUNNEL),
    ("ipsec_user", ExtendedKeyUsagePurpose::IPSEC_USER),
    ("time_stamping", ExtendedKeyUsagePurpose::TIME_STAMPING),
    ("ocsp_signing", ExtendedKeyUsagePurpose::OCSP_SIGNING),
    ("any_extended_key_usage", ExtendedKeyUsagePurpose::ANY),
];

impl ExtendedKeyUsagePurpose {
    pub const SERVER_AUTH: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.1"));
    pub const CLIENT_AUTH: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.2"));
    pub const CODE_SIGNING: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.3"));
    pub const EMAIL_PROTECTION: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.4"));
    pub const IPSEC_END_SYSTEM: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.5"));
    pub const IPSEC_TUNNEL: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.6"));
    pub const IPSEC_USER: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.7"));
    pub const TIME_STAMPING: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.8"));
    pub const OCSP_SIGNING: Self = Self(ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.9"));
    pub const ANY: Self = Self(ObjectIdentifier::new_unwrap("2.5.29.37.0"));

    #[must_use]
    pub fn from_oid(oid: ObjectIdentifier) -> Self {
        Self(oid)
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        self.0
    }

    /// Short name for well-known purposes.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        NAMED_PURPOSES
            .iter()
            .find(|(_, p)| p == self)
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for ExtendedKeyUsagePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for ExtendedKeyUsagePurpose {
    type Err = CsrError;

    /// Accepts a well-known name or a dotted OID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, purpose)) = NAMED_PURPOSES.iter().find(|(name, _)| *name == s) {
            return Ok(*purpose);
        }
        ObjectIdentifier::new(s)
            .map(Self)
            .map_err(|_| CsrError::ConfigurationError(format!("unknown extended key usage {s:?}")))
    }
}

impl TryFrom<String> for ExtendedKeyUsagePurpose {
    type Error = CsrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExtendedKeyUsagePurpose> for String {
    fn from(value: ExtendedKeyUsagePurpose) -> Self {
        value.to_string()
    }
}
