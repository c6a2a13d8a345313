//! Wraps the signed info bytes, algorithm identifier and signature into the
//! final `CertificationRequest`.

use der::asn1::BitString;
use der::{Decode, Encode, Header, Length, Tag};
use x509_cert::request::CertReqInfo;

use crate::domain::crypto::{CsrSignature, SignatureAlgorithmChoice};
use crate::domain::request::CertificationRequest;
use crate::infra::error::{CsrError, CsrResult};

#[derive(Default)]
pub struct RequestFinalizer;

impl RequestFinalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Assemble the signed request.
    ///
    /// `info_der` is embedded verbatim; it is parsed only to check it is a
    /// well-formed `CertificationRequestInfo`. The signature is not verified.
    ///
    /// # Errors
    /// Returns error if `info_der` does not parse or encoding fails.
    pub fn finalize(
        &self,
        info_der: &[u8],
        choice: &SignatureAlgorithmChoice,
        signature: &CsrSignature,
    ) -> CsrResult<CertificationRequest> {
        CertReqInfo::from_der(info_der).map_err(|e| {
            CsrError::EncodingError(format!("signed bytes are not a CertificationRequestInfo: {e}"))
        })?;

        let algorithm = choice.algorithm_identifier()?.to_der()?;
        let signature = BitString::from_bytes(signature.as_slice())?.to_der()?;

        let body_len = Length::try_from(info_der.len() + algorithm.len() + signature.len())?;
        let mut der = Header::new(Tag::Sequence, body_len)?.to_der()?;
        der.reserve(usize::try_from(body_len)?);
        der.extend_from_slice(info_der);
        der.extend_from_slice(&algorithm);
        der.extend_from_slice(&signature);

        log::debug!("CertificationRequest is {} bytes", der.len());
        CertificationRequest::from_der(der)
    }
}
