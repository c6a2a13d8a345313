//! Subject distinguished name model.
//!
//! A subject is either an already-built X.509 `Name` or a mapping from
//! registry keys (`common_name`, `country_name`, ...) to text values. Mapping
//! input is put in canonical attribute order and every attribute becomes its
//! own RDN.

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, SetOfVec};
use der::Tag;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use crate::infra::error::{CsrError, CsrResult};

const OID_JURISDICTION_COUNTRY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.60.2.1.3");
const OID_JURISDICTION_STATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.60.2.1.2");
const OID_JURISDICTION_LOCALITY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.60.2.1.1");
const OID_BUSINESS_CATEGORY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.15");
const OID_SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
const OID_COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_POSTAL_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.17");
const OID_STATE_OR_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_STREET: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const OID_TITLE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.12");
const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_INITIALS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.43");
const OID_GENERATION_QUALIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.44");
const OID_SURNAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.4");
const OID_GIVEN_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.42");
const OID_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.41");
const OID_PSEUDONYM: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.65");
const OID_DN_QUALIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.46");
const OID_EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");
const OID_DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25");

/// ASN.1 string type a registry attribute is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Printable,
    Ia5,
    Utf8,
}

/// Closed registry of subject attribute types.
///
/// Declaration order is the canonical order attributes are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameAttribute {
    IncorporationCountry,
    IncorporationStateOrProvince,
    IncorporationLocality,
    BusinessCategory,
    SerialNumber,
    CountryName,
    PostalCode,
    StateOrProvinceName,
    LocalityName,
    StreetAddress,
    OrganizationName,
    OrganizationalUnitName,
    Title,
    CommonName,
    Initials,
    GenerationQualifier,
    Surname,
    GivenName,
    Name,
    Pseudonym,
    DnQualifier,
    EmailAddress,
    DomainComponent,
}

impl NameAttribute {
    pub const ALL: [NameAttribute; 23] = [
        NameAttribute::IncorporationCountry,
        NameAttribute::IncorporationStateOrProvince,
        NameAttribute::IncorporationLocality,
        NameAttribute::BusinessCategory,
        NameAttribute::SerialNumber,
        NameAttribute::CountryName,
        NameAttribute::PostalCode,
        NameAttribute::StateOrProvinceName,
        NameAttribute::LocalityName,
        NameAttribute::StreetAddress,
        NameAttribute::OrganizationName,
        NameAttribute::OrganizationalUnitName,
        NameAttribute::Title,
        NameAttribute::CommonName,
        NameAttribute::Initials,
        NameAttribute::GenerationQualifier,
        NameAttribute::Surname,
        NameAttribute::GivenName,
        NameAttribute::Name,
        NameAttribute::Pseudonym,
        NameAttribute::DnQualifier,
        NameAttribute::EmailAddress,
        NameAttribute::DomainComponent,
    ];

    /// Mapping key for this attribute.
    pub fn key(&self) -> &'static str {
        match self {
            NameAttribute::IncorporationCountry => "incorporation_country",
            NameAttribute::IncorporationStateOrProvince => "incorporation_state_or_province",
            NameAttribute::IncorporationLocality => "incorporation_locality",
            NameAttribute::BusinessCategory => "business_category",
            NameAttribute::SerialNumber => "serial_number",
            NameAttribute::CountryName => "country_name",
            NameAttribute::PostalCode => "postal_code",
            NameAttribute::StateOrProvinceName => "state_or_province_name",
            NameAttribute::LocalityName => "locality_name",
            NameAttribute::StreetAddress => "street_address",
            NameAttribute::OrganizationName => "organization_name",
            NameAttribute::OrganizationalUnitName => "organizational_unit_name",
            NameAttribute::Title => "title",
            NameAttribute::CommonName => "common_name",
            NameAttribute::Initials => "initials",
            NameAttribute::GenerationQualifier => "generation_qualifier",
            NameAttribute::Surname => "surname",
            NameAttribute::GivenName => "given_name",
            NameAttribute::Name => "name",
            NameAttribute::Pseudonym => "pseudonym",
            NameAttribute::DnQualifier => "dn_qualifier",
            NameAttribute::EmailAddress => "email_address",
            NameAttribute::DomainComponent => "domain_component",
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            NameAttribute::IncorporationCountry => OID_JURISDICTION_COUNTRY,
            NameAttribute::IncorporationStateOrProvince => OID_JURISDICTION_STATE,
            NameAttribute::IncorporationLocality => OID_JURISDICTION_LOCALITY,
            NameAttribute::BusinessCategory => OID_BUSINESS_CATEGORY,
            NameAttribute::SerialNumber => OID_SERIAL_NUMBER,
            NameAttribute::CountryName => OID_COUNTRY_NAME,
            NameAttribute::PostalCode => OID_POSTAL_CODE,
            NameAttribute::StateOrProvinceName => OID_STATE_OR_PROVINCE,
            NameAttribute::LocalityName => OID_LOCALITY,
            NameAttribute::StreetAddress => OID_STREET,
            NameAttribute::OrganizationName => OID_ORGANIZATION,
            NameAttribute::OrganizationalUnitName => OID_ORGANIZATIONAL_UNIT,
            NameAttribute::Title => OID_TITLE,
            NameAttribute::CommonName => OID_COMMON_NAME,
            NameAttribute::Initials => OID_INITIALS,
            NameAttribute::GenerationQualifier => OID_GENERATION_QUALIFIER,
            NameAttribute::Surname => OID_SURNAME,
            NameAttribute::GivenName => OID_GIVEN_NAME,
            NameAttribute::Name => OID_NAME,
            NameAttribute::Pseudonym => OID_PSEUDONYM,
            NameAttribute::DnQualifier => OID_DN_QUALIFIER,
            NameAttribute::EmailAddress => OID_EMAIL_ADDRESS,
            NameAttribute::DomainComponent => OID_DOMAIN_COMPONENT,
        }
    }

    /// Attributes that may appear more than once; all others keep only the
    /// last value written.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            NameAttribute::DomainComponent | NameAttribute::OrganizationalUnitName
        )
    }

    fn string_kind(&self) -> StringKind {
        match self {
            NameAttribute::CountryName
            | NameAttribute::SerialNumber
            | NameAttribute::DnQualifier
            | NameAttribute::IncorporationCountry => StringKind::Printable,
            NameAttribute::EmailAddress | NameAttribute::DomainComponent => StringKind::Ia5,
            _ => StringKind::Utf8,
        }
    }

    fn encode_value(&self, value: &str) -> CsrResult<Any> {
        let invalid = |reason: &str| CsrError::InvalidAttribute {
            key: self.key().to_string(),
            reason: reason.to_string(),
        };
        if value.is_empty() {
            return Err(invalid("value must not be empty"));
        }
        let tag = match self.string_kind() {
            StringKind::Printable => {
                if !is_printable_string(value) {
                    return Err(invalid("value is not a valid PrintableString"));
                }
                Tag::PrintableString
            }
            StringKind::Ia5 => {
                if !value.is_ascii() {
                    return Err(invalid("value is not a valid IA5String"));
                }
                Tag::Ia5String
            }
            StringKind::Utf8 => Tag::Utf8String,
        };
        Any::new(tag, value.as_bytes()).map_err(|e| invalid(&e.to_string()))
    }
}

impl fmt::Display for NameAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for NameAttribute {
    type Err = CsrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NameAttribute::ALL
            .iter()
            .copied()
            .find(|a| a.key() == s)
            .ok_or_else(|| CsrError::InvalidAttribute {
                key: s.to_string(),
                reason: "not a recognized subject attribute".into(),
            })
    }
}

fn is_printable_string(value: &str) -> bool {
    value.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
            )
    })
}

/// Subject given as key/value pairs.
///
/// Keys are checked when the name is built, not on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectName {
    entries: Vec<(String, String)>,
}

impl SubjectName {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Single-valued attributes replace any earlier value;
    /// multi-valued ones append, keeping caller order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let multi = key
            .parse::<NameAttribute>()
            .map(|a| a.is_multi_valued())
            .unwrap_or(false);
        if !multi {
            self.entries.retain(|(k, _)| *k != key);
        }
        self.entries.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove every value stored under `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubjectName {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut subject = SubjectName::new();
        for (k, v) in iter {
            subject.insert(k, v);
        }
        subject
    }
}

/// Subject as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectInput {
    /// Pre-built name, used exactly as given.
    Name(Name),
    Mapping(SubjectName),
}

impl SubjectInput {
    /// True when the built name would have no RDNs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            SubjectInput::Name(name) => name.0.is_empty(),
            SubjectInput::Mapping(map) => map.is_empty(),
        }
    }
}

impl Default for SubjectInput {
    fn default() -> Self {
        SubjectInput::Mapping(SubjectName::new())
    }
}

impl From<Name> for SubjectInput {
    fn from(name: Name) -> Self {
        SubjectInput::Name(name)
    }
}

impl From<SubjectName> for SubjectInput {
    fn from(map: SubjectName) -> Self {
        SubjectInput::Mapping(map)
    }
}

/// Build the X.509 subject name.
pub fn build_name(input: &SubjectInput) -> CsrResult<Name> {
    let map = match input {
        SubjectInput::Name(name) => return Ok(name.clone()),
        SubjectInput::Mapping(map) => map,
    };

    let mut attrs = map
        .iter()
        .map(|(key, value)| Ok((key.parse::<NameAttribute>()?, value)))
        .collect::<CsrResult<Vec<_>>>()?;
    // Stable: repeated multi-valued keys keep their relative order.
    attrs.sort_by_key(|(attr, _)| *attr);

    let mut rdns = Vec::with_capacity(attrs.len());
    for (attr, value) in attrs {
        let atv = AttributeTypeAndValue {
            oid: attr.oid(),
            value: attr.encode_value(value)?,
        };
        rdns.push(RelativeDistinguishedName::from(SetOfVec::try_from(vec![atv])?));
    }
    Ok(RdnSequence(rdns))
}
