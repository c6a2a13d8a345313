//! Builds and serializes the `CertificationRequestInfo`.
//!
//! The DER produced here is exactly what gets signed, so it must be a pure
//! function of the inputs.

use der::asn1::{Any, SetOfVec};
use der::Encode;
use x509_cert::attr::Attribute;
use x509_cert::name::Name;
use x509_cert::request::{CertReqInfo, Version};

use crate::domain::constants::OID_EXTENSION_REQUEST;
use crate::domain::extensions::{CriticalityPolicy, ExtensionSet};
use crate::domain::public_key::PublicKeyInfo;
use crate::infra::error::CsrResult;

pub struct RequestAssembler {
    criticality: CriticalityPolicy,
}

impl RequestAssembler {
    #[must_use]
    pub fn new(criticality: CriticalityPolicy) -> Self {
        Self { criticality }
    }

    /// Encode the extension set into the attribute list. No extensionRequest
    /// attribute is emitted for an empty set.
    ///
    /// # Errors
    /// Returns error if an extension value is unknown or malformed.
    pub fn build_attributes(
        &self,
        subject: &Name,
        extensions: &ExtensionSet,
    ) -> CsrResult<SetOfVec<Attribute>> {
        let extensions = extensions.to_extensions(self.criticality, subject.0.is_empty())?;
        if extensions.is_empty() {
            return Ok(SetOfVec::new());
        }
        log::debug!("Requesting {} extension(s)", extensions.len());
        let attribute = Attribute {
            oid: OID_EXTENSION_REQUEST,
            values: SetOfVec::try_from(vec![Any::encode_from(&extensions)?])?,
        };
        Ok(SetOfVec::try_from(vec![attribute])?)
    }

    /// Produce the DER encoding of the `CertificationRequestInfo`.
    ///
    /// # Errors
    /// Returns error if the extensions are invalid or encoding fails.
    pub fn assemble(
        &self,
        subject: &Name,
        public_key: &PublicKeyInfo,
        extensions: &ExtensionSet,
    ) -> CsrResult<Vec<u8>> {
        let info = CertReqInfo {
            version: Version::V1,
            subject: subject.clone(),
            public_key: public_key.spki().clone(),
            attributes: self.build_attributes(subject, extensions)?,
        };
        let der = info.to_der()?;
        log::debug!("CertificationRequestInfo is {} bytes", der.len());
        Ok(der)
    }
}

impl Default for RequestAssembler {
    fn default() -> Self {
        Self::new(CriticalityPolicy::NonCritical)
    }
}
