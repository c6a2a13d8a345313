//! PEM transport encoding (RFC 7468) for certification requests.

use der::pem::{self, LineEnding};

use crate::domain::request::CertificationRequest;
use crate::infra::error::{CsrError, CsrResult};

/// Type label of a PKCS#10 request.
pub const CSR_PEM_LABEL: &str = "CERTIFICATE REQUEST";

const PRE_ENCAPSULATION: &[u8] = b"-----BEGIN ";

/// PEM text of a finished request, wrapped at 64 columns with LF endings.
///
/// # Errors
/// Returns error if PEM encoding fails.
pub fn pem_armor_csr(request: &CertificationRequest) -> CsrResult<String> {
    pem::encode_string(CSR_PEM_LABEL, LineEnding::LF, request.as_der())
        .map_err(|e| CsrError::EncodingError(format!("PEM encoding failed: {e}")))
}

/// Decode a PEM `CERTIFICATE REQUEST`. Explanatory text before the
/// encapsulation boundary is skipped.
///
/// # Errors
/// `EncodingError` for malformed PEM, any other label, or a body that is not
/// a certification request.
pub fn decode_csr_pem(text: &[u8]) -> CsrResult<CertificationRequest> {
    let start = find_boundary(text)
        .ok_or_else(|| CsrError::EncodingError("no PEM encapsulation boundary found".into()))?;
    let (label, der) = pem::decode_vec(&text[start..])
        .map_err(|e| CsrError::EncodingError(format!("PEM decoding failed: {e}")))?;
    if label != CSR_PEM_LABEL {
        return Err(CsrError::EncodingError(format!(
            "expected PEM label {CSR_PEM_LABEL:?}, found {label:?}"
        )));
    }
    CertificationRequest::from_der(der)
}

/// Read a request given as PEM or raw DER.
///
/// # Errors
/// See [`decode_csr_pem`] and [`CertificationRequest::from_der`].
pub fn read_csr(bytes: &[u8]) -> CsrResult<CertificationRequest> {
    if find_boundary(bytes).is_some() {
        decode_csr_pem(bytes)
    } else {
        CertificationRequest::from_der(bytes.to_vec())
    }
}

fn find_boundary(text: &[u8]) -> Option<usize> {
    text.windows(PRE_ENCAPSULATION.len())
        .position(|w| w == PRE_ENCAPSULATION)
}
