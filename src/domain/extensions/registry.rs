//! Structural decoders for extension values supplied through the generic path.
//!
//! An encoded value is accepted only if its OID is listed here and the bytes
//! decode as that extension's ASN.1 type.

use const_oid::ObjectIdentifier;
use der::asn1::Null;
use der::Decode;
use x509_cert::ext::pkix::{
    AuthorityInfoAccessSyntax, AuthorityKeyIdentifier, BasicConstraints, CertificatePolicies,
    CrlDistributionPoints, ExtendedKeyUsage, FreshestCrl, InhibitAnyPolicy, IssuerAltName,
    KeyUsage, NameConstraints, PolicyConstraints, PolicyMappings, PrivateKeyUsagePeriod,
    SubjectAltName, SubjectDirectoryAttributes, SubjectInfoAccessSyntax, SubjectKeyIdentifier,
};

/// Criticality RFC 5280 / RFC 6960 suggest for an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecommendedCriticality {
    Critical,
    NonCritical,
    /// basic constraints: critical for CA requests
    WhenCa,
    /// subject alternative name: critical when the subject is empty
    WhenSubjectEmpty,
}

pub(crate) struct KnownExtension {
    pub(crate) oid: ObjectIdentifier,
    pub(crate) name: &'static str,
    pub(crate) criticality: RecommendedCriticality,
    check: fn(&[u8]) -> der::Result<()>,
}

impl KnownExtension {
    pub(crate) fn check(&self, der: &[u8]) -> der::Result<()> {
        (self.check)(der)
    }
}

fn decodes_as<T: for<'a> Decode<'a>>(der: &[u8]) -> der::Result<()> {
    T::from_der(der).map(|_| ())
}

const fn known(
    oid: &str,
    name: &'static str,
    criticality: RecommendedCriticality,
    check: fn(&[u8]) -> der::Result<()>,
) -> KnownExtension {
    KnownExtension {
        oid: ObjectIdentifier::new_unwrap(oid),
        name,
        criticality,
        check,
    }
}

use RecommendedCriticality::{Critical, NonCritical, WhenCa, WhenSubjectEmpty};

static KNOWN_EXTENSIONS: [KnownExtension; 19] = [
    known("2.5.29.9", "subject_directory_attributes", NonCritical, decodes_as::<SubjectDirectoryAttributes>),
    known("2.5.29.14", "key_identifier", NonCritical, decodes_as::<SubjectKeyIdentifier>),
    known("2.5.29.15", "key_usage", Critical, decodes_as::<KeyUsage>),
    known("2.5.29.16", "private_key_usage_period", NonCritical, decodes_as::<PrivateKeyUsagePeriod>),
    known("2.5.29.17", "subject_alt_name", WhenSubjectEmpty, decodes_as::<SubjectAltName>),
    known("2.5.29.18", "issuer_alt_name", NonCritical, decodes_as::<IssuerAltName>),
    known("2.5.29.19", "basic_constraints", WhenCa, decodes_as::<BasicConstraints>),
    known("2.5.29.30", "name_constraints", Critical, decodes_as::<NameConstraints>),
    known("2.5.29.31", "crl_distribution_points", NonCritical, decodes_as::<CrlDistributionPoints>),
    known("2.5.29.32", "certificate_policies", NonCritical, decodes_as::<CertificatePolicies>),
    known("2.5.29.33", "policy_mappings", Critical, decodes_as::<PolicyMappings>),
    known("2.5.29.35", "authority_key_identifier", NonCritical, decodes_as::<AuthorityKeyIdentifier>),
    known("2.5.29.36", "policy_constraints", Critical, decodes_as::<PolicyConstraints>),
    known("2.5.29.37", "extended_key_usage", NonCritical, decodes_as::<ExtendedKeyUsage>),
    known("2.5.29.46", "freshest_crl", NonCritical, decodes_as::<FreshestCrl>),
    known("2.5.29.54", "inhibit_any_policy", Critical, decodes_as::<InhibitAnyPolicy>),
    known("1.3.6.1.5.5.7.1.1", "authority_information_access", NonCritical, decodes_as::<AuthorityInfoAccessSyntax>),
    known("1.3.6.1.5.5.7.1.11", "subject_information_access", NonCritical, decodes_as::<SubjectInfoAccessSyntax>),
    // TLS feature is a SEQUENCE OF INTEGER; OCSP no-check is NULL.
    known("1.3.6.1.5.5.7.1.24", "tls_feature", NonCritical, decodes_as::<Vec<u16>>),
];

static OCSP_NO_CHECK: KnownExtension = known(
    "1.3.6.1.5.5.7.48.1.5",
    "ocsp_no_check",
    NonCritical,
    decodes_as::<Null>,
);

pub(crate) fn lookup(oid: &ObjectIdentifier) -> Option<&'static KnownExtension> {
    KNOWN_EXTENSIONS
        .iter()
        .chain(std::iter::once(&OCSP_NO_CHECK))
        .find(|ext| ext.oid == *oid)
}

/// Whether encoded values for `oid` can be structurally checked.
#[must_use]
pub fn is_known_extension(oid: &ObjectIdentifier) -> bool {
    lookup(oid).is_some()
}

/// Registry name of a known extension, e.g. `key_usage`.
#[must_use]
pub fn known_extension_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    lookup(oid).map(|ext| ext.name)
}
