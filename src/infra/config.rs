//! Configuration management infrastructure.
//!
//! A configuration file describes one certification request (subject,
//! algorithms, extensions) plus how to reach the key-management proxy. The
//! bearer token is never stored here; the CLI reads it from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use const_oid::ObjectIdentifier;
use serde::{Deserialize, Serialize};

use crate::domain::crypto::SignerAlgorithm;
use crate::domain::extensions::{
    CriticalityPolicy, ExtendedKeyUsagePurpose, ExtensionValue, KeyUsageFlag,
};
use crate::domain::name::SubjectName;
use crate::domain::types::MessageType;
use crate::infra::error::{CsrError, CsrResult};
use crate::pipelines::build::CsrBuilder;
use crate::HashAlgorithm;

/// A subject attribute value: one string, or several for repeatable
/// attributes such as `domain_component`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectValue {
    One(String),
    Many(Vec<String>),
}

/// Generic extension entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Dotted OID, e.g. `2.5.29.32`.
    pub oid: String,
    /// Base64 DER of the extension value.
    pub value_b64: String,
    /// Pass the value through untyped. Required for OIDs the registry does not
    /// know; a known OID is still checked against its registered type.
    #[serde(default)]
    pub opaque: bool,
}

/// Remote key-management proxy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    pub verify_tls: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 30,
            verify_tls: true,
        }
    }
}

/// Request description as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrConfiguration {
    /// Subject attributes keyed by name (`common_name`, `country_name`, ...).
    #[serde(default)]
    pub subject: BTreeMap<String, SubjectValue>,

    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    #[serde(default = "default_signing_algorithm")]
    pub signing_algorithm: String,

    /// Absent means no basic constraints request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<bool>,

    #[serde(default)]
    pub subject_alt_domains: Vec<String>,

    #[serde(default)]
    pub subject_alt_ips: Vec<String>,

    /// Overrides the CA-derived key usage when present; an empty list
    /// removes the extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_usage: Option<Vec<KeyUsageFlag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_key_usage: Option<Vec<ExtendedKeyUsagePurpose>>,

    #[serde(default)]
    pub extensions: Vec<ExtensionConfig>,

    #[serde(default)]
    pub criticality: CriticalityPolicy,

    #[serde(default)]
    pub message_type: MessageType,

    #[serde(default)]
    pub service: ServiceConfig,
}

fn default_hash_algorithm() -> String {
    HashAlgorithm::Sha256.as_str().to_string()
}

fn default_signing_algorithm() -> String {
    SignerAlgorithm::RsassaPssSha256.as_str().to_string()
}

impl Default for CsrConfiguration {
    fn default() -> Self {
        let mut subject = BTreeMap::new();
        subject.insert(
            "common_name".to_string(),
            SubjectValue::One("example.com".to_string()),
        );
        Self {
            subject,
            hash_algorithm: default_hash_algorithm(),
            signing_algorithm: default_signing_algorithm(),
            ca: Some(false),
            subject_alt_domains: vec!["example.com".to_string()],
            subject_alt_ips: Vec::new(),
            key_usage: None,
            extended_key_usage: None,
            extensions: Vec::new(),
            criticality: CriticalityPolicy::NonCritical,
            message_type: MessageType::Raw,
            service: ServiceConfig::default(),
        }
    }
}

impl CsrConfiguration {
    /// Convert into a builder. Text fields are parsed here; consistency of
    /// the result is checked when the builder runs.
    ///
    /// # Errors
    /// Returns error for unparseable algorithm names, OIDs or base64 values.
    pub fn to_builder(&self) -> CsrResult<CsrBuilder> {
        let mut subject = SubjectName::new();
        for (key, value) in &self.subject {
            match value {
                SubjectValue::One(v) => {
                    subject.insert(key.as_str(), v.as_str());
                }
                SubjectValue::Many(values) => {
                    for v in values {
                        subject.insert(key.as_str(), v.as_str());
                    }
                }
            }
        }

        let mut builder = CsrBuilder::new(subject);
        builder
            .set_hash_algorithm(self.hash_algorithm.parse()?)
            .set_signing_algorithm(self.signing_algorithm.parse()?)
            .set_ca(self.ca)
            .set_subject_alt_domains(self.subject_alt_domains.iter().cloned())
            .set_subject_alt_ips(self.subject_alt_ips.iter().cloned())
            .set_criticality(self.criticality)
            .set_message_type(self.message_type);

        if let Some(flags) = &self.key_usage {
            builder.set_key_usage(flags.iter().copied());
        }
        if let Some(purposes) = &self.extended_key_usage {
            builder.set_extended_key_usage(purposes.iter().copied());
        }

        for ext in &self.extensions {
            let oid = ObjectIdentifier::new(&ext.oid).map_err(|e| {
                CsrError::ConfigurationError(format!("Invalid extension OID {:?}: {e}", ext.oid))
            })?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&ext.value_b64)
                .map_err(|e| {
                    CsrError::ConfigurationError(format!(
                        "Invalid base64 value for extension {oid}: {e}"
                    ))
                })?;
            let value = if ext.opaque {
                ExtensionValue::Opaque(bytes)
            } else {
                ExtensionValue::Encoded(bytes)
            };
            builder.set_extension(oid, Some(value));
        }

        Ok(builder)
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> CsrResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> CsrResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("kms-csr-builder").join("config.toml"))
        } else {
            Ok(PathBuf::from("kms-csr-builder-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> CsrResult<CsrConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = CsrConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> CsrResult<CsrConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            CsrError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: CsrConfiguration = toml::from_str(&content).map_err(|e| {
            CsrError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        self.validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &CsrConfiguration) -> CsrResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CsrError::ConfigurationError(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            CsrError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            CsrError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Validate configuration values
    fn validate_config(&self, config: &CsrConfiguration) -> CsrResult<()> {
        config.to_builder()?.validate()?;

        if config.service.timeout_seconds == 0 {
            return Err(CsrError::ConfigurationError(
                "Service timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(endpoint) = &config.service.endpoint {
            let url = reqwest::Url::parse(endpoint).map_err(|e| {
                CsrError::ConfigurationError(format!("Invalid service endpoint {endpoint:?}: {e}"))
            })?;
            if !matches!(url.scheme(), "https" | "http") {
                return Err(CsrError::ConfigurationError(format!(
                    "Service endpoint must be http(s), not {}",
                    url.scheme()
                )));
            }
        }

        Ok(())
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> CsrResult<String> {
        let config = self.load()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| CsrError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| CsrError::ConfigurationError(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| CsrError::ConfigurationError(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> CsrResult<()> {
        let config: CsrConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content).map_err(|e| {
                CsrError::ConfigurationError(format!("TOML import failed: {e}"))
            })?,
            ExportFormat::Json => serde_json::from_str(content).map_err(|e| {
                CsrError::ConfigurationError(format!("JSON import failed: {e}"))
            })?,
            ExportFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                CsrError::ConfigurationError(format!("YAML import failed: {e}"))
            })?,
        };

        self.validate_config(&config)?;
        self.save(&config)
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}
