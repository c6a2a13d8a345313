//! KMS CSR Builder CLI
//!
//! Builds a PKCS#10 certification request from a configuration file and has
//! it signed by a remote key-management proxy.

use clap::{Parser, Subcommand, ValueEnum};
use kms_csr_builder::{
    adapters::remote::{RemoteKmsClient, RemoteKmsConfig},
    domain::extensions::known_extension_name,
    infra::config::{ConfigManager, CsrConfiguration, ExportFormat},
    pem_armor_csr, read_csr, CertificationRequest, CsrError, KeyReference,
};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kms-csr")]
#[command(about = "Build PKCS#10 certificate signing requests signed by a remote KMS")]
#[command(long_about = "
KMS CSR Builder - certificate signing requests without exporting the key

EXAMPLES:
    # Create a configuration file to edit
    kms-csr config init

    # Build a request with the key held by the proxy
    kms-csr build --key alias/web-server --endpoint https://kms-proxy.internal

    # Inspect an existing request
    kms-csr inspect request.csr

ENVIRONMENT VARIABLES:
    KMS_CSR_TOKEN   Bearer token for the key-management proxy (required for build)
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and sign a certification request
    Build {
        /// Key identifier, alias or ARN known to the service
        #[arg(short, long, value_name = "KEY_ID")]
        key: String,

        /// Request configuration file (defaults to the user configuration)
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Service endpoint (overrides config)
        #[arg(short, long, value_name = "URL")]
        endpoint: Option<String>,

        /// Bearer token for the service (not needed with --dry-run)
        #[arg(long, env = "KMS_CSR_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,

        /// Write DER instead of PEM
        #[arg(long)]
        der: bool,

        /// Skip TLS certificate verification of the endpoint
        #[arg(long)]
        insecure: bool,

        /// Validate configuration without contacting the service
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the contents of a certification request
    Inspect {
        /// PEM or DER encoded request
        #[arg(value_name = "CSR_FILE")]
        file: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Print the configuration file location
    Path,

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import configuration
    Import {
        /// Configuration file to import
        file: PathBuf,
        /// Import format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
    },
}

#[derive(ValueEnum, Clone)]
enum ExportFormatArg {
    Toml,
    Json,
    Yaml,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Yaml => ExportFormat::Yaml,
        }
    }
}

/// Parameters for the build command
struct BuildCommandArgs {
    key: String,
    config: Option<PathBuf>,
    endpoint: Option<String>,
    token: Option<String>,
    output: Option<PathBuf>,
    der: bool,
    insecure: bool,
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            key,
            config,
            endpoint,
            token,
            output,
            der,
            insecure,
            dry_run,
        } => {
            let args = BuildCommandArgs {
                key,
                config,
                endpoint,
                token,
                output,
                der,
                insecure,
                dry_run,
            };
            handle_build_command(args).await?;
        }

        Commands::Inspect { file } => {
            handle_inspect_command(&file)?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd)?;
        }
    }

    Ok(())
}

fn config_manager(path: Option<&Path>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new().into_diagnostic(),
    }
}

async fn handle_build_command(args: BuildCommandArgs) -> Result<()> {
    let manager = config_manager(args.config.as_deref())?;
    let config = manager.load()?;
    let key = KeyReference::new(&args.key)?;

    let builder = config.to_builder()?;
    builder.validate()?;

    if args.dry_run {
        eprintln!("Configuration is valid: {}", manager.config_path().display());
        eprintln!(
            "  Algorithm: {} with {}",
            builder.signing_algorithm(),
            builder.hash_algorithm()
        );
        eprintln!("  Key: {key}");
        return Ok(());
    }

    let endpoint = args
        .endpoint
        .or_else(|| config.service.endpoint.clone())
        .ok_or_else(|| {
            CsrError::ConfigurationError(
                "No service endpoint given; pass --endpoint or set service.endpoint".to_string(),
            )
        })?;

    let token = args.token.ok_or_else(|| {
        CsrError::ConfigurationError(
            "No service token given; pass --token or set KMS_CSR_TOKEN".to_string(),
        )
    })?;

    let mut remote = RemoteKmsConfig::new(endpoint, token)
        .with_timeout(config.service.timeout_seconds);
    if args.insecure || !config.service.verify_tls {
        log::warn!("TLS certificate verification is disabled for the service endpoint");
        remote = remote.with_insecure_tls();
    }
    let client = RemoteKmsClient::new(remote)?;

    let request = builder.build_async(&client, &key).await?;

    let bytes = if args.der {
        request.as_der().to_vec()
    } else {
        pem_armor_csr(&request)?.into_bytes()
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &bytes).into_diagnostic()?;
            eprintln!("Certification request written to: {}", path.display());
        }
        None if args.der => {
            use std::io::Write;
            std::io::stdout().write_all(&bytes).into_diagnostic()?;
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }

    Ok(())
}

fn read_request(path: &Path) -> Result<CertificationRequest> {
    let raw = std::fs::read(path).into_diagnostic()?;
    Ok(read_csr(&raw)?)
}

fn handle_inspect_command(file: &Path) -> Result<()> {
    let request = read_request(file)?;

    println!("Certification Request: {}", file.display());
    println!("  Subject: {}", request.subject());
    println!(
        "  Signature algorithm: {}",
        request.signature_algorithm().oid
    );
    println!("  Signature length: {} bytes", request.signature().len());

    let extensions = request.extensions()?;
    if extensions.is_empty() {
        println!("  Requested extensions: none");
    } else {
        println!("  Requested extensions:");
        for ext in extensions {
            let name = known_extension_name(&ext.extn_id).unwrap_or("unknown");
            println!(
                "    {} ({}){}",
                ext.extn_id,
                name,
                if ext.critical { " critical" } else { "" }
            );
        }
    }

    Ok(())
}

fn handle_config_command(config_cmd: ConfigCommands) -> Result<()> {
    let config_manager = ConfigManager::new().into_diagnostic()?;

    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => print_configuration(&config_manager, &config),
            Err(_) => {
                println!("No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            let _config = config_manager.load_or_create_default()?;
            println!(
                "Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to describe the request subject and extensions.");
        }

        ConfigCommands::Path => {
            println!("{}", config_manager.config_path().display());
        }

        ConfigCommands::Export { format, output } => {
            let content = config_manager.export_config(format.into())?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content).into_diagnostic()?;
                println!("Configuration exported to: {}", output_path.display());
            } else {
                println!("{content}");
            }
        }

        ConfigCommands::Import { file, format } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            config_manager.import_config(&content, format.into())?;
            println!("Configuration imported from: {}", file.display());
        }
    }

    Ok(())
}

fn print_configuration(manager: &ConfigManager, config: &CsrConfiguration) {
    println!("Current Configuration:");
    println!("  Subject attributes: {}", config.subject.len());
    println!("  Hash algorithm: {}", config.hash_algorithm);
    println!("  Signing algorithm: {}", config.signing_algorithm);
    match config.ca {
        Some(ca) => println!("  CA: {ca}"),
        None => println!("  CA: not requested"),
    }
    println!("  SAN DNS names: {}", config.subject_alt_domains.len());
    println!("  SAN IP addresses: {}", config.subject_alt_ips.len());
    println!("  Extra extensions: {}", config.extensions.len());
    println!(
        "  Service endpoint: {}",
        config.service.endpoint.as_deref().unwrap_or("<not set>")
    );
    println!("  Configuration file: {}", manager.config_path().display());
}
