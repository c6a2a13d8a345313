//! Finished certification request.

use std::fmt;

use der::{Decode, Encode, Header, Reader, SliceReader, Tag};
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::request::CertReq;

use super::constants::OID_EXTENSION_REQUEST;
use crate::infra::error::{CsrError, CsrResult};

/// Signed PKCS#10 request.
///
/// Holds the exact DER produced (or read) together with its parsed form. The
/// `CertificationRequestInfo` bytes are sliced out of the outer encoding, so
/// they are the bytes that were signed.
#[derive(Clone)]
pub struct CertificationRequest {
    der: Box<[u8]>,
    info_range: (usize, usize),
    parsed: CertReq,
}

impl CertificationRequest {
    /// Parse a DER encoded `CertificationRequest`.
    pub fn from_der(der: Vec<u8>) -> CsrResult<Self> {
        let parsed = CertReq::from_der(&der)?;
        let info_range = info_range(&der)?;
        Ok(Self {
            der: der.into_boxed_slice(),
            info_range,
            parsed,
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der.into()
    }

    /// DER of the embedded `CertificationRequestInfo`, byte-for-byte.
    #[must_use]
    pub fn info_der(&self) -> &[u8] {
        &self.der[self.info_range.0..self.info_range.1]
    }

    #[must_use]
    pub fn cert_req(&self) -> &CertReq {
        &self.parsed
    }

    #[must_use]
    pub fn subject(&self) -> &Name {
        &self.parsed.info.subject
    }

    pub fn public_key_der(&self) -> CsrResult<Vec<u8>> {
        Ok(self.parsed.info.public_key.to_der()?)
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> &AlgorithmIdentifierOwned {
        &self.parsed.algorithm
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        self.parsed.signature.raw_bytes()
    }

    /// Extensions carried in the PKCS#9 extensionRequest attribute, or an
    /// empty list when the attribute is absent.
    pub fn extensions(&self) -> CsrResult<Vec<Extension>> {
        let Some(attr) = self
            .parsed
            .info
            .attributes
            .iter()
            .find(|a| a.oid == OID_EXTENSION_REQUEST)
        else {
            return Ok(Vec::new());
        };
        let mut values = attr.values.iter();
        match (values.next(), values.next()) {
            (Some(value), None) => Ok(Vec::<Extension>::from_der(&value.to_der()?)?),
            _ => Err(CsrError::EncodingError(
                "extensionRequest attribute must carry exactly one value".into(),
            )),
        }
    }
}

impl fmt::Debug for CertificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CertificationRequest(subject={}, len={})",
            self.parsed.info.subject,
            self.der.len()
        )
    }
}

/// Byte range of the first element inside the outer SEQUENCE.
fn info_range(der: &[u8]) -> der::Result<(usize, usize)> {
    let mut reader = SliceReader::new(der)?;
    let outer = Header::decode(&mut reader)?;
    outer.tag.assert_eq(Tag::Sequence)?;
    let start = usize::try_from(reader.position())?;
    let info = Header::decode(&mut reader)?;
    info.tag.assert_eq(Tag::Sequence)?;
    let len = usize::try_from((info.encoded_len()? + info.length)?)?;
    let end = start + len;
    if end > der.len() {
        return Err(Tag::Sequence.length_error());
    }
    Ok((start, end))
}
