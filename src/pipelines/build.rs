//! `CsrBuilder` holds the caller's request configuration and runs the build
//! workflow: validate, fetch the public key, assemble, sign, finalize.
//!
//! Setters only record values. Everything is checked at the start of
//! [`CsrBuilder::build`], before the key-management service is contacted.

use std::collections::BTreeSet;

use const_oid::ObjectIdentifier;
use x509_cert::name::Name;

use crate::adapters::backend::{AsyncKeyManagementService, KeyManagementService};
use crate::domain::crypto::{SignatureAlgorithmChoice, SignerAlgorithm};
use crate::domain::extensions::{
    CriticalityPolicy, ExtendedKeyUsagePurpose, ExtensionSet, ExtensionValue, KeyUsageFlag,
};
use crate::domain::name::{build_name, SubjectInput};
use crate::domain::request::CertificationRequest;
use crate::domain::types::{KeyReference, MessageType};
use crate::infra::error::CsrResult;
use crate::services::{PublicKeyAdapter, RequestAssembler, RequestFinalizer, SignerGateway};
use crate::HashAlgorithm;

/// Configuration surface for one certification request.
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    subject: SubjectInput,
    hash_algorithm: HashAlgorithm,
    signing_algorithm: SignerAlgorithm,
    extensions: ExtensionSet,
    criticality: CriticalityPolicy,
    message_type: MessageType,
}

/// Configuration snapshot that passed validation.
struct Validated {
    subject: Name,
    choice: SignatureAlgorithmChoice,
}

impl CsrBuilder {
    /// New builder for an end-entity request: CA flag `false` (with its key
    /// usage defaults), `sha256` and `RSASSA_PSS_SHA_256`.
    #[must_use]
    pub fn new(subject: impl Into<SubjectInput>) -> Self {
        let mut builder = Self {
            subject: subject.into(),
            hash_algorithm: HashAlgorithm::Sha256,
            signing_algorithm: SignerAlgorithm::RsassaPssSha256,
            extensions: ExtensionSet::new(),
            criticality: CriticalityPolicy::default(),
            message_type: MessageType::default(),
        };
        builder.set_ca(Some(false));
        builder
    }

    #[must_use]
    pub fn subject(&self) -> &SubjectInput {
        &self.subject
    }

    pub fn set_subject(&mut self, subject: impl Into<SubjectInput>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn set_hash_algorithm(&mut self, hash: HashAlgorithm) -> &mut Self {
        self.hash_algorithm = hash;
        self
    }

    #[must_use]
    pub fn signing_algorithm(&self) -> SignerAlgorithm {
        self.signing_algorithm
    }

    pub fn set_signing_algorithm(&mut self, algorithm: SignerAlgorithm) -> &mut Self {
        self.signing_algorithm = algorithm;
        self
    }

    /// Set the signer algorithm together with the digest it implies.
    pub fn set_algorithm(&mut self, choice: SignatureAlgorithmChoice) -> &mut Self {
        self.hash_algorithm = choice.hash();
        self.signing_algorithm = choice.signer();
        self
    }

    #[must_use]
    pub fn algorithm_choice(&self) -> SignatureAlgorithmChoice {
        SignatureAlgorithmChoice::new(self.hash_algorithm, self.signing_algorithm)
    }

    /// Tri-state CA flag. `None` when no basic constraints are requested.
    #[must_use]
    pub fn ca(&self) -> Option<bool> {
        self.extensions.basic_constraints()
    }

    /// `Some(true)` also requests key usage `key_cert_sign, crl_sign` and
    /// extended key usage `ocsp_signing`; `Some(false)` requests
    /// `digital_signature, key_encipherment` and `server_auth, client_auth`.
    /// `None` drops basic constraints only.
    pub fn set_ca(&mut self, ca: Option<bool>) -> &mut Self {
        self.extensions.set_basic_constraints(ca);
        match ca {
            Some(true) => {
                self.extensions
                    .set_key_usage([KeyUsageFlag::KeyCertSign, KeyUsageFlag::CrlSign]);
                self.extensions
                    .set_extended_key_usage([ExtendedKeyUsagePurpose::OCSP_SIGNING]);
            }
            Some(false) => {
                self.extensions.set_key_usage([
                    KeyUsageFlag::DigitalSignature,
                    KeyUsageFlag::KeyEncipherment,
                ]);
                self.extensions.set_extended_key_usage([
                    ExtendedKeyUsagePurpose::SERVER_AUTH,
                    ExtendedKeyUsagePurpose::CLIENT_AUTH,
                ]);
            }
            None => {}
        }
        self
    }

    #[must_use]
    pub fn subject_alt_domains(&self) -> Vec<String> {
        self.extensions.subject_alt_domains()
    }

    /// An empty list (together with no IPs) removes the SAN request.
    pub fn set_subject_alt_domains<I, S>(&mut self, domains: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.set_subject_alt_domains(domains);
        self
    }

    #[must_use]
    pub fn subject_alt_ips(&self) -> Vec<String> {
        self.extensions.subject_alt_ips()
    }

    pub fn set_subject_alt_ips<I, S>(&mut self, ips: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.set_subject_alt_ips(ips);
        self
    }

    #[must_use]
    pub fn key_usage(&self) -> BTreeSet<KeyUsageFlag> {
        self.extensions.key_usage()
    }

    pub fn set_key_usage<I: IntoIterator<Item = KeyUsageFlag>>(&mut self, flags: I) -> &mut Self {
        self.extensions.set_key_usage(flags);
        self
    }

    #[must_use]
    pub fn extended_key_usage(&self) -> BTreeSet<ExtendedKeyUsagePurpose> {
        self.extensions.extended_key_usage()
    }

    pub fn set_extended_key_usage<I: IntoIterator<Item = ExtendedKeyUsagePurpose>>(
        &mut self,
        purposes: I,
    ) -> &mut Self {
        self.extensions.set_extended_key_usage(purposes);
        self
    }

    /// Generic extension setter; see [`ExtensionSet::set_extension`].
    pub fn set_extension(
        &mut self,
        oid: ObjectIdentifier,
        value: Option<ExtensionValue>,
    ) -> &mut Self {
        self.extensions.set_extension(oid, value);
        self
    }

    #[must_use]
    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    #[must_use]
    pub fn criticality(&self) -> CriticalityPolicy {
        self.criticality
    }

    pub fn set_criticality(&mut self, policy: CriticalityPolicy) -> &mut Self {
        self.criticality = policy;
        self
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn set_message_type(&mut self, message_type: MessageType) -> &mut Self {
        self.message_type = message_type;
        self
    }

    /// Check the whole configuration without contacting the service.
    ///
    /// # Errors
    /// Any configuration error `build` would report before its first
    /// external call.
    pub fn validate(&self) -> CsrResult<()> {
        self.validated().map(|_| ())
    }

    fn validated(&self) -> CsrResult<Validated> {
        let choice = self.algorithm_choice();
        SignerGateway::new(choice, self.message_type).validate()?;
        let subject = build_name(&self.subject)?;
        self.extensions
            .to_extensions(self.criticality, subject.0.is_empty())?;
        Ok(Validated { subject, choice })
    }

    /// Build and sign a request with `key`.
    ///
    /// # Errors
    /// Configuration errors are returned before the service is called. A
    /// failed public key fetch returns before signing is attempted.
    pub fn build<S>(&self, service: &S, key: &KeyReference) -> CsrResult<CertificationRequest>
    where
        S: KeyManagementService + ?Sized,
    {
        let Validated { subject, choice } = self.validated()?;
        log::info!("Building certification request for '{subject}' with key {key}");

        let public_key = PublicKeyAdapter::new(choice).fetch(service, key)?;
        let info_der =
            RequestAssembler::new(self.criticality).assemble(&subject, &public_key, &self.extensions)?;
        let signature =
            SignerGateway::new(choice, self.message_type).sign(service, key, &info_der)?;
        let request = RequestFinalizer::new().finalize(&info_der, &choice, &signature)?;

        log::info!("Certification request signed with {}", choice.signer());
        Ok(request)
    }

    /// Async variant of [`build`](Self::build). Only the two service calls
    /// suspend.
    ///
    /// # Errors
    /// Same as [`build`](Self::build).
    pub async fn build_async<S>(
        &self,
        service: &S,
        key: &KeyReference,
    ) -> CsrResult<CertificationRequest>
    where
        S: AsyncKeyManagementService + ?Sized,
    {
        let Validated { subject, choice } = self.validated()?;
        log::info!("Building certification request for '{subject}' with key {key}");

        let public_key = PublicKeyAdapter::new(choice)
            .fetch_async(service, key)
            .await?;
        let info_der =
            RequestAssembler::new(self.criticality).assemble(&subject, &public_key, &self.extensions)?;
        let signature = SignerGateway::new(choice, self.message_type)
            .sign_async(service, key, &info_der)
            .await?;
        let request = RequestFinalizer::new().finalize(&info_der, &choice, &signature)?;

        log::info!("Certification request signed with {}", choice.signer());
        Ok(request)
    }
}
