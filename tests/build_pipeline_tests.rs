//! End-to-end tests for the build workflow against an in-memory service.

mod common;

use common::fixtures;
use common::stub_kms::{Call, StubKms};
use const_oid::ObjectIdentifier;
use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use der::{Decode, Encode};
use kms_csr_builder::domain::constants::{
    OID_EXTENSION_REQUEST, OID_RSASSA_PSS, OID_SHA256_WITH_RSA,
};
use kms_csr_builder::domain::extensions::{
    OID_BASIC_CONSTRAINTS, OID_EXTENDED_KEY_USAGE, OID_KEY_USAGE, OID_SUBJECT_ALT_NAME,
};
use kms_csr_builder::domain::crypto::compute_digest;
use kms_csr_builder::*;
use x509_cert::ext::pkix::{KeyUsage, KeyUsages};
use x509_cert::request::CertReqInfo;

fn key() -> KeyReference {
    KeyReference::new("alias/csr-test").unwrap()
}

fn patrick() -> SubjectName {
    SubjectName::new()
        .with("country_name", "IE")
        .with("organization_name", "Test")
        .with("common_name", "Patrick")
}

/// A builder that requests no extensions at all.
fn bare_builder(subject: SubjectName) -> CsrBuilder {
    let mut builder = CsrBuilder::new(subject);
    builder
        .set_ca(None)
        .set_key_usage(std::iter::empty())
        .set_extended_key_usage(std::iter::empty());
    builder
}

fn extension_oids(request: &CertificationRequest) -> Vec<String> {
    request
        .extensions()
        .unwrap()
        .iter()
        .map(|ext| ext.extn_id.to_string())
        .collect()
}

#[test]
fn test_signed_bytes_are_the_info_der() {
    let kms = StubKms::rsa();
    let mut builder = bare_builder(patrick());
    builder.set_signing_algorithm(SignerAlgorithm::RsassaPkcs1V15Sha256);

    let request = builder.build(&kms, &key()).unwrap();

    let signs = kms.sign_requests();
    assert_eq!(signs.len(), 1);
    assert_eq!(signs[0].message, request.info_der());
    assert_eq!(signs[0].message_type, MessageType::Raw);
    assert_eq!(signs[0].algorithm, SignerAlgorithm::RsassaPkcs1V15Sha256);
    assert_eq!(signs[0].key, key());

    assert_eq!(request.signature(), StubKms::fixed_signature().as_slice());
    assert_eq!(request.cert_req().signature.unused_bits(), 0);

    let algorithm = request.signature_algorithm();
    assert_eq!(algorithm.oid, OID_SHA256_WITH_RSA);
    assert_eq!(algorithm.parameters.as_ref().unwrap().to_der().unwrap(), [0x05, 0x00]);

    assert!(request.cert_req().info.attributes.is_empty());
    assert_eq!(request.public_key_der().unwrap(), fixtures::rsa_2048_spki());
}

#[test]
fn test_subject_is_canonically_ordered() {
    let kms = StubKms::rsa();
    let request = bare_builder(patrick()).build(&kms, &key()).unwrap();

    let rdns = &request.subject().0;
    assert_eq!(rdns.len(), 3);
    let values: Vec<(String, Vec<u8>)> = rdns
        .iter()
        .map(|rdn| {
            assert_eq!(rdn.0.len(), 1);
            let atv = rdn.0.iter().next().unwrap();
            (atv.oid.to_string(), atv.value.value().to_vec())
        })
        .collect();
    assert_eq!(
        values,
        vec![
            ("2.5.4.6".to_string(), b"IE".to_vec()),
            ("2.5.4.10".to_string(), b"Test".to_vec()),
            ("2.5.4.3".to_string(), b"Patrick".to_vec()),
        ]
    );

    let country = rdns[0].0.iter().next().unwrap();
    assert!(country.value.decode_as::<PrintableStringRef>().is_ok());
    let cn = rdns[2].0.iter().next().unwrap();
    assert!(cn.value.decode_as::<Utf8StringRef>().is_ok());
}

#[test]
fn test_insertion_order_does_not_change_output() {
    let reversed = SubjectName::new()
        .with("common_name", "Patrick")
        .with("organization_name", "Test")
        .with("country_name", "IE");

    let kms = StubKms::rsa();
    let a = bare_builder(patrick()).build(&kms, &key()).unwrap();
    let b = bare_builder(reversed).build(&kms, &key()).unwrap();
    assert_eq!(a.as_der(), b.as_der());
}

#[test]
fn test_domain_components_keep_their_order() {
    let subject = SubjectName::new()
        .with("domain_component", "example")
        .with("common_name", "host")
        .with("domain_component", "com");

    let kms = StubKms::rsa();
    let request = bare_builder(subject).build(&kms, &key()).unwrap();

    let dcs: Vec<&[u8]> = request
        .subject()
        .0
        .iter()
        .filter_map(|rdn| rdn.0.iter().next())
        .filter(|atv| atv.oid.to_string() == "0.9.2342.19200300.100.1.25")
        .map(|atv| {
            assert!(atv.value.decode_as::<Ia5StringRef>().is_ok());
            atv.value.value()
        })
        .collect();
    assert_eq!(dcs, vec![b"example".as_slice(), b"com".as_slice()]);
}

#[test]
fn test_builds_are_deterministic() {
    let kms = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder.set_subject_alt_domains(["patrick.example", "www.patrick.example"]);

    let first = builder.build(&kms, &key()).unwrap();
    let second = builder.build(&kms, &key()).unwrap();
    assert_eq!(first.as_der(), second.as_der());
}

#[test]
fn test_default_extensions_in_request_order() {
    let kms = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder.set_subject_alt_ips(["192.0.2.10"]);
    builder.set_subject_alt_domains(["patrick.example"]);

    let request = builder.build(&kms, &key()).unwrap();

    let attributes = &request.cert_req().info.attributes;
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes.iter().next().unwrap().oid, OID_EXTENSION_REQUEST);

    assert_eq!(
        extension_oids(&request),
        vec![
            OID_BASIC_CONSTRAINTS.to_string(),
            OID_SUBJECT_ALT_NAME.to_string(),
            OID_KEY_USAGE.to_string(),
            OID_EXTENDED_KEY_USAGE.to_string(),
        ]
    );
    assert!(request.extensions().unwrap().iter().all(|ext| !ext.critical));
}

#[test]
fn test_cleared_san_is_removed() {
    let kms = StubKms::rsa();
    let mut builder = bare_builder(patrick());
    builder.set_subject_alt_domains(["patrick.example"]);
    builder.set_subject_alt_domains(std::iter::empty::<String>());

    assert!(builder.subject_alt_domains().is_empty());
    let request = builder.build(&kms, &key()).unwrap();
    assert!(request.cert_req().info.attributes.is_empty());
    assert!(request.extensions().unwrap().is_empty());
}

#[test]
fn test_generic_key_usage_overrides_convenience_value() {
    let encoded = KeyUsage(KeyUsages::KeyCertSign.into()).to_der().unwrap();

    let kms = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder.set_extension(OID_KEY_USAGE, Some(ExtensionValue::Encoded(encoded.clone())));

    assert_eq!(
        builder.key_usage().into_iter().collect::<Vec<_>>(),
        vec![KeyUsageFlag::KeyCertSign]
    );

    let request = builder.build(&kms, &key()).unwrap();
    let extensions = request.extensions().unwrap();
    let ku = extensions
        .iter()
        .find(|ext| ext.extn_id == OID_KEY_USAGE)
        .unwrap();
    assert_eq!(ku.extn_value.as_bytes(), encoded.as_slice());
    assert_eq!(
        extensions
            .iter()
            .filter(|ext| ext.extn_id == OID_KEY_USAGE)
            .count(),
        1
    );
}

#[test]
fn test_recommended_criticality_for_ca() {
    let kms = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder
        .set_ca(Some(true))
        .set_criticality(CriticalityPolicy::Recommended);

    let request = builder.build(&kms, &key()).unwrap();
    let extensions = request.extensions().unwrap();
    let bc = extensions
        .iter()
        .find(|ext| ext.extn_id == OID_BASIC_CONSTRAINTS)
        .unwrap();
    assert!(bc.critical);
    let eku = extensions
        .iter()
        .find(|ext| ext.extn_id == OID_EXTENDED_KEY_USAGE)
        .unwrap();
    assert!(!eku.critical);
}

#[test]
fn test_opaque_extension_is_embedded_verbatim() {
    let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.99999.7");
    let value = vec![0x0c, 0x03, b'a', b'b', b'c'];

    let kms = StubKms::rsa();
    let mut builder = bare_builder(patrick());
    builder.set_extension(oid, Some(ExtensionValue::Opaque(value.clone())));

    let request = builder.build(&kms, &key()).unwrap();
    let extensions = request.extensions().unwrap();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].extn_id, oid);
    assert_eq!(extensions[0].extn_value.as_bytes(), value.as_slice());
}

#[test]
fn test_configuration_errors_happen_before_any_call() {
    let unknown = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.99999.8");
    let mut builder = CsrBuilder::new(patrick());
    builder.set_extension(unknown, Some(ExtensionValue::Encoded(vec![0x05, 0x00])));

    let kms = StubKms::rsa();
    let err = builder.build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::UnknownExtensionOid(_)));
    assert!(kms.calls().is_empty());

    let mut builder = CsrBuilder::new(SubjectName::new().with("country_name", "Ireland_"));
    builder.set_ca(None);
    let err = builder.build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::InvalidAttribute { .. }));
    assert!(kms.calls().is_empty());
}

#[test]
fn test_sm2_is_rejected_for_every_key_type() {
    for kms in [
        StubKms::rsa(),
        StubKms::ec_p256(),
        StubKms::with_public_key(fixtures::sm2_spki()),
    ] {
        let mut builder = CsrBuilder::new(patrick());
        builder.set_signing_algorithm(SignerAlgorithm::Sm2Dsa);

        let err = builder.build(&kms, &key()).unwrap_err();
        assert!(matches!(err, CsrError::AlgorithmUnsupported { .. }));
        assert!(kms.calls().is_empty());
    }
}

#[test]
fn test_missing_key_never_signs() {
    let kms = StubKms::rsa().missing_key();
    let err = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap_err();

    assert!(matches!(err, CsrError::KeyNotFound(_)));
    assert!(err.is_signer_stage());
    assert_eq!(kms.calls(), vec![Call::GetPublicKey(key())]);
}

#[test]
fn test_algorithm_key_mismatch_never_signs() {
    let kms = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder.set_signing_algorithm(SignerAlgorithm::EcdsaSha256);

    let err = builder.build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::AlgorithmUnsupported { .. }));
    assert!(kms.sign_requests().is_empty());
}

#[test]
fn test_key_usage_of_service_key_is_checked() {
    let kms = StubKms::rsa().with_key_usage(KeyUsageType::EncryptDecrypt);
    let err = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::KeyTypeUnsupported { .. }));
    assert!(kms.sign_requests().is_empty());

    let kms = StubKms::rsa().with_signing_algorithms(vec![SignerAlgorithm::RsassaPkcs1V15Sha256]);
    let err = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::AlgorithmUnsupported { .. }));
}

#[test]
fn test_empty_signature_is_rejected() {
    let kms = StubKms::rsa().with_signature(Vec::new());
    let err = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap_err();
    assert!(matches!(err, CsrError::SignerRejected { .. }));
}

#[test]
fn test_digest_mode_sends_local_digest() {
    let kms = StubKms::ec_p256();
    let mut builder = CsrBuilder::new(patrick());
    builder
        .set_algorithm(SignatureAlgorithmChoice::for_signer(SignerAlgorithm::EcdsaSha256).unwrap())
        .set_message_type(MessageType::Digest);

    let request = builder.build(&kms, &key()).unwrap();
    let signs = kms.sign_requests();
    let expected = compute_digest(HashAlgorithm::Sha256, request.info_der());
    assert_eq!(signs[0].message, expected);
    assert_eq!(signs[0].message_type, MessageType::Digest);

    let algorithm = request.signature_algorithm();
    assert_eq!(algorithm.oid.to_string(), "1.2.840.10045.4.3.2");
    assert!(algorithm.parameters.is_none());
}

#[test]
fn test_pss_carries_parameters() {
    let kms = StubKms::rsa();
    let request = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap();

    let algorithm = request.signature_algorithm();
    assert_eq!(algorithm.oid, OID_RSASSA_PSS);
    assert!(algorithm.parameters.is_some());
}

#[test]
fn test_ed25519_key() {
    let kms = StubKms::with_public_key(fixtures::ed25519_spki());
    let mut builder = CsrBuilder::new(patrick());
    builder.set_algorithm(
        SignatureAlgorithmChoice::for_signer(SignerAlgorithm::Ed25519Sha512).unwrap(),
    );

    let request = builder.build(&kms, &key()).unwrap();
    assert_eq!(request.signature_algorithm().oid.to_string(), "1.3.101.112");
}

#[test]
fn test_output_reparses_and_armors() {
    let kms = StubKms::rsa();
    let request = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap();

    let info = CertReqInfo::from_der(request.info_der()).unwrap();
    assert_eq!(info, request.cert_req().info);

    let reparsed = CertificationRequest::from_der(request.as_der().to_vec()).unwrap();
    assert_eq!(reparsed.as_der(), request.as_der());

    let pem = pem_armor_csr(&request).unwrap();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
    assert!(pem.trim_end().ends_with("-----END CERTIFICATE REQUEST-----"));
    assert!(pem.lines().all(|line| line.len() <= 64));
}

#[test]
fn test_pem_reads_back_with_explanatory_text() {
    let kms = StubKms::rsa();
    let request = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap();
    let pem = pem_armor_csr(&request).unwrap();

    let with_preamble = format!("Subject: CN=Patrick, O=Test, C=IE\n{pem}");
    let decoded = decode_csr_pem(with_preamble.as_bytes()).unwrap();
    assert_eq!(decoded.as_der(), request.as_der());

    assert_eq!(read_csr(pem.as_bytes()).unwrap().as_der(), request.as_der());
    assert_eq!(read_csr(request.as_der()).unwrap().as_der(), request.as_der());
}

#[test]
fn test_pem_with_other_label_is_rejected() {
    let kms = StubKms::rsa();
    let request = CsrBuilder::new(patrick()).build(&kms, &key()).unwrap();
    let relabelled = pem_armor_csr(&request)
        .unwrap()
        .replace("CERTIFICATE REQUEST", "PRIVATE KEY");

    assert!(matches!(
        read_csr(relabelled.as_bytes()),
        Err(CsrError::EncodingError(_))
    ));
}

#[tokio::test]
async fn test_async_build_matches_blocking_build() {
    let blocking = StubKms::rsa();
    let asynchronous = StubKms::rsa();
    let mut builder = CsrBuilder::new(patrick());
    builder.set_subject_alt_domains(["patrick.example"]);

    let a = builder.build(&blocking, &key()).unwrap();
    let b = builder.build_async(&asynchronous, &key()).await.unwrap();

    assert_eq!(a.as_der(), b.as_der());
    assert_eq!(blocking.calls(), asynchronous.calls());
}

#[tokio::test]
async fn test_async_missing_key() {
    let kms = StubKms::rsa().missing_key();
    let err = CsrBuilder::new(patrick())
        .build_async(&kms, &key())
        .await
        .unwrap_err();
    assert!(matches!(err, CsrError::KeyNotFound(_)));
    assert!(kms.sign_requests().is_empty());
}
