//! Requested certificate extensions.
//!
//! Four well-known extensions have convenience slots (basic constraints,
//! subject alternative name, key usage, extended key usage); anything else
//! goes through the generic OID/value path.

mod registry;
mod set;
mod usage;

pub use registry::{is_known_extension, known_extension_name};
pub use set::{CriticalityPolicy, ExtensionRequest, ExtensionSet, ExtensionValue};
pub use usage::{ExtendedKeyUsagePurpose, KeyUsageFlag};

use const_oid::ObjectIdentifier;

/// basicConstraints (2.5.29.19)
pub const OID_BASIC_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.19");
/// subjectAltName (2.5.29.17)
pub const OID_SUBJECT_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");
/// keyUsage (2.5.29.15)
pub const OID_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
/// extKeyUsage (2.5.29.37)
pub const OID_EXTENDED_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37");
