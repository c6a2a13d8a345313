use std::collections::BTreeSet;
use std::net::IpAddr;

use const_oid::ObjectIdentifier;
use der::asn1::{Ia5String, OctetString};
use der::{Decode, Encode};
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName};
use x509_cert::ext::Extension;

use super::registry::{self, RecommendedCriticality};
use super::usage::{ExtendedKeyUsagePurpose, KeyUsageFlag};
use super::{OID_BASIC_CONSTRAINTS, OID_EXTENDED_KEY_USAGE, OID_KEY_USAGE, OID_SUBJECT_ALT_NAME};
use crate::infra::error::{CsrError, CsrResult};

/// How the `critical` flag is chosen for each requested extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityPolicy {
    /// Every extension is marked non-critical.
    #[default]
    NonCritical,
    /// Use the criticality RFC 5280 and RFC 6960 recommend.
    Recommended,
}

/// Value supplied through the generic extension path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    /// DER `extnValue` contents, decoded against the known-extension
    /// registry before use.
    Encoded(Vec<u8>),
    /// DER contents for extensions the registry does not know; used as-is.
    /// A known OID is still checked against its registered type.
    Opaque(Vec<u8>),
}

impl ExtensionValue {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ExtensionValue::Encoded(b) | ExtensionValue::Opaque(b) => b,
        }
    }

    fn checked(&self, oid: &ObjectIdentifier) -> CsrResult<&[u8]> {
        let bytes = self.as_bytes();
        let Some(known) = registry::lookup(oid) else {
            return match self {
                ExtensionValue::Opaque(_) => Ok(bytes),
                ExtensionValue::Encoded(_) => Err(CsrError::UnknownExtensionOid(oid.to_string())),
            };
        };
        known
            .check(bytes)
            .map_err(|e| CsrError::MalformedExtensionValue {
                oid: oid.to_string(),
                reason: format!("not a valid {} value: {e}", known.name),
            })?;
        Ok(bytes)
    }
}

/// A single requested extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionRequest {
    BasicConstraints {
        is_ca: bool,
    },
    /// DNS names and IP addresses merged into one extension.
    SubjectAltName {
        dns_names: Vec<String>,
        ip_addresses: Vec<String>,
    },
    KeyUsage(BTreeSet<KeyUsageFlag>),
    ExtendedKeyUsage(BTreeSet<ExtendedKeyUsagePurpose>),
    Generic {
        oid: ObjectIdentifier,
        value: ExtensionValue,
    },
}

impl ExtensionRequest {
    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            ExtensionRequest::BasicConstraints { .. } => OID_BASIC_CONSTRAINTS,
            ExtensionRequest::SubjectAltName { .. } => OID_SUBJECT_ALT_NAME,
            ExtensionRequest::KeyUsage(_) => OID_KEY_USAGE,
            ExtensionRequest::ExtendedKeyUsage(_) => OID_EXTENDED_KEY_USAGE,
            ExtensionRequest::Generic { oid, .. } => *oid,
        }
    }

    /// DER encoding of the extension value (the contents of `extnValue`).
    pub fn encode_value(&self) -> CsrResult<Vec<u8>> {
        let oid = self.oid();
        let malformed = |reason: String| CsrError::MalformedExtensionValue {
            oid: oid.to_string(),
            reason,
        };
        let der = match self {
            ExtensionRequest::BasicConstraints { is_ca } => BasicConstraints {
                ca: *is_ca,
                path_len_constraint: None,
            }
            .to_der()?,
            ExtensionRequest::SubjectAltName {
                dns_names,
                ip_addresses,
            } => {
                let mut names = Vec::with_capacity(dns_names.len() + ip_addresses.len());
                for dns in dns_names {
                    let ia5 = Ia5String::new(dns)
                        .map_err(|e| malformed(format!("DNS name {dns:?}: {e}")))?;
                    names.push(GeneralName::DnsName(ia5));
                }
                for ip in ip_addresses {
                    let addr: IpAddr = ip
                        .parse()
                        .map_err(|_| malformed(format!("{ip:?} is not an IP address")))?;
                    let octets = match addr {
                        IpAddr::V4(v4) => v4.octets().to_vec(),
                        IpAddr::V6(v6) => v6.octets().to_vec(),
                    };
                    names.push(GeneralName::IpAddress(OctetString::new(octets)?));
                }
                SubjectAltName(names).to_der()?
            }
            ExtensionRequest::KeyUsage(flags) => {
                let mut bits = der::flagset::FlagSet::default();
                for flag in flags {
                    bits |= flag.to_x509();
                }
                KeyUsage(bits).to_der()?
            }
            ExtensionRequest::ExtendedKeyUsage(purposes) => {
                ExtendedKeyUsage(purposes.iter().map(|p| p.oid()).collect()).to_der()?
            }
            ExtensionRequest::Generic { oid, value } => value.checked(oid)?.to_vec(),
        };
        Ok(der)
    }

    /// CA flag carried by a basic constraints request, typed or generic.
    fn is_ca(&self) -> Option<bool> {
        match self {
            ExtensionRequest::BasicConstraints { is_ca } => Some(*is_ca),
            ExtensionRequest::Generic { oid, value } if *oid == OID_BASIC_CONSTRAINTS => {
                BasicConstraints::from_der(value.as_bytes())
                    .ok()
                    .map(|bc| bc.ca)
            }
            _ => None,
        }
    }
}

/// Ordered collection of requested extensions, at most one per OID.
///
/// Setters never fail; values are validated when the set is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    basic_constraints: Option<ExtensionRequest>,
    subject_alt_name: Option<ExtensionRequest>,
    key_usage: Option<ExtensionRequest>,
    extended_key_usage: Option<ExtensionRequest>,
    others: Vec<(ObjectIdentifier, ExtensionValue)>,
}

impl ExtensionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basic_constraints.is_none()
            && self.subject_alt_name.is_none()
            && self.key_usage.is_none()
            && self.extended_key_usage.is_none()
            && self.others.is_empty()
    }

    /// `None` removes the basic constraints request.
    pub fn set_basic_constraints(&mut self, is_ca: Option<bool>) {
        self.basic_constraints = is_ca.map(|is_ca| ExtensionRequest::BasicConstraints { is_ca });
    }

    #[must_use]
    pub fn basic_constraints(&self) -> Option<bool> {
        self.basic_constraints.as_ref().and_then(ExtensionRequest::is_ca)
    }

    /// Replace the DNS names, keeping IP addresses. A generic SAN value is
    /// discarded.
    pub fn set_subject_alt_domains<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ips = self.subject_alt_ips();
        self.set_subject_alt(domains.into_iter().map(Into::into).collect(), ips);
    }

    /// Replace the IP addresses, keeping DNS names.
    pub fn set_subject_alt_ips<I, S>(&mut self, ips: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains = self.subject_alt_domains();
        self.set_subject_alt(domains, ips.into_iter().map(Into::into).collect());
    }

    fn set_subject_alt(&mut self, dns_names: Vec<String>, ip_addresses: Vec<String>) {
        self.subject_alt_name = if dns_names.is_empty() && ip_addresses.is_empty() {
            None
        } else {
            Some(ExtensionRequest::SubjectAltName {
                dns_names,
                ip_addresses,
            })
        };
    }

    #[must_use]
    pub fn subject_alt_domains(&self) -> Vec<String> {
        match &self.subject_alt_name {
            Some(ExtensionRequest::SubjectAltName { dns_names, .. }) => dns_names.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn subject_alt_ips(&self) -> Vec<String> {
        match &self.subject_alt_name {
            Some(ExtensionRequest::SubjectAltName { ip_addresses, .. }) => ip_addresses.clone(),
            _ => Vec::new(),
        }
    }

    /// An empty set removes the key usage request.
    pub fn set_key_usage<I: IntoIterator<Item = KeyUsageFlag>>(&mut self, flags: I) {
        let flags: BTreeSet<_> = flags.into_iter().collect();
        self.key_usage = (!flags.is_empty()).then_some(ExtensionRequest::KeyUsage(flags));
    }

    /// Requested key usage flags; decoded from a generic value if one
    /// replaced the convenience setting.
    #[must_use]
    pub fn key_usage(&self) -> BTreeSet<KeyUsageFlag> {
        match &self.key_usage {
            Some(ExtensionRequest::KeyUsage(flags)) => flags.clone(),
            Some(ExtensionRequest::Generic { value, .. }) => KeyUsage::from_der(value.as_bytes())
                .map(|ku| KeyUsageFlag::from_x509(ku.0).into_iter().collect())
                .unwrap_or_default(),
            _ => BTreeSet::new(),
        }
    }

    /// An empty set removes the extended key usage request.
    pub fn set_extended_key_usage<I: IntoIterator<Item = ExtendedKeyUsagePurpose>>(
        &mut self,
        purposes: I,
    ) {
        let purposes: BTreeSet<_> = purposes.into_iter().collect();
        self.extended_key_usage =
            (!purposes.is_empty()).then_some(ExtensionRequest::ExtendedKeyUsage(purposes));
    }

    #[must_use]
    pub fn extended_key_usage(&self) -> BTreeSet<ExtendedKeyUsagePurpose> {
        match &self.extended_key_usage {
            Some(ExtensionRequest::ExtendedKeyUsage(purposes)) => purposes.clone(),
            Some(ExtensionRequest::Generic { value, .. }) => {
                ExtendedKeyUsage::from_der(value.as_bytes())
                    .map(|eku| {
                        eku.0
                            .into_iter()
                            .map(ExtendedKeyUsagePurpose::from_oid)
                            .collect()
                    })
                    .unwrap_or_default()
            }
            _ => BTreeSet::new(),
        }
    }

    /// Generic setter. An OID with a convenience slot replaces that slot's
    /// value; any other OID replaces an earlier value in place or is
    /// appended. `None` removes the extension.
    pub fn set_extension(&mut self, oid: ObjectIdentifier, value: Option<ExtensionValue>) {
        if let Some(slot) = self.slot_mut(&oid) {
            *slot = value.map(|value| ExtensionRequest::Generic { oid, value });
            return;
        }
        let existing = self.others.iter().position(|(o, _)| *o == oid);
        match (existing, value) {
            (Some(i), Some(value)) => self.others[i].1 = value,
            (Some(i), None) => {
                self.others.remove(i);
            }
            (None, Some(value)) => self.others.push((oid, value)),
            (None, None) => {}
        }
    }

    /// Value stored through the generic path, if any.
    #[must_use]
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&ExtensionValue> {
        let slot = match *oid {
            OID_BASIC_CONSTRAINTS => &self.basic_constraints,
            OID_SUBJECT_ALT_NAME => &self.subject_alt_name,
            OID_KEY_USAGE => &self.key_usage,
            OID_EXTENDED_KEY_USAGE => &self.extended_key_usage,
            _ => {
                return self
                    .others
                    .iter()
                    .find(|(o, _)| o == oid)
                    .map(|(_, v)| v)
            }
        };
        match slot {
            Some(ExtensionRequest::Generic { value, .. }) => Some(value),
            _ => None,
        }
    }

    fn slot_mut(&mut self, oid: &ObjectIdentifier) -> Option<&mut Option<ExtensionRequest>> {
        match *oid {
            OID_BASIC_CONSTRAINTS => Some(&mut self.basic_constraints),
            OID_SUBJECT_ALT_NAME => Some(&mut self.subject_alt_name),
            OID_KEY_USAGE => Some(&mut self.key_usage),
            OID_EXTENDED_KEY_USAGE => Some(&mut self.extended_key_usage),
            _ => None,
        }
    }

    /// Requests in serialization order: basic constraints, subject
    /// alternative name, key usage, extended key usage, then generic
    /// extensions in insertion order.
    #[must_use]
    pub fn requests(&self) -> Vec<ExtensionRequest> {
        [
            &self.basic_constraints,
            &self.subject_alt_name,
            &self.key_usage,
            &self.extended_key_usage,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .chain(self.others.iter().map(|(oid, value)| ExtensionRequest::Generic {
            oid: *oid,
            value: value.clone(),
        }))
        .collect()
    }

    /// Encode every request as an X.509 `Extension`.
    ///
    /// `subject_is_empty` only matters under [`CriticalityPolicy::Recommended`].
    pub fn to_extensions(
        &self,
        policy: CriticalityPolicy,
        subject_is_empty: bool,
    ) -> CsrResult<Vec<Extension>> {
        let is_ca = self.basic_constraints() == Some(true);
        self.requests()
            .iter()
            .map(|request| -> CsrResult<Extension> {
                let extn_id = request.oid();
                let critical = match policy {
                    CriticalityPolicy::NonCritical => false,
                    CriticalityPolicy::Recommended => registry::lookup(&extn_id)
                        .map(|known| match known.criticality {
                            RecommendedCriticality::Critical => true,
                            RecommendedCriticality::NonCritical => false,
                            RecommendedCriticality::WhenCa => is_ca,
                            RecommendedCriticality::WhenSubjectEmpty => subject_is_empty,
                        })
                        .unwrap_or(false),
                };
                Ok(Extension {
                    extn_id,
                    critical,
                    extn_value: OctetString::new(request.encode_value()?)?,
                })
            })
            .collect()
    }
}
