//! Shared command line for the demo servers.
//!
//! Both binaries start in paid mode with the same x402 price (0.001 USDC on Base) unless
//! `--free` is given or a config file without an `x402` block is loaded.

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use openmesh_server::{MeshConfig, MeshServer, X402Config, load_config, shutdown_signal};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_AMOUNT: &str = "0.001";
pub const DEFAULT_ASSET: &str = "USDC";
pub const DEFAULT_NETWORK: &str = "base-mainnet";
pub const DEFAULT_RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb4";

/// Static description of one demo application.
#[derive(Debug, Clone, Copy)]
pub struct AppProfile {
    pub name: &'static str,
    /// Name used when started with `--free`.
    pub free_name: &'static str,
    pub description: &'static str,
    pub default_port: u16,
    /// Environment variable consulted for the port when `--port` is absent.
    pub port_env: Option<&'static str>,
}

pub const SENTIMENT_ANALYZER: AppProfile = AppProfile {
    name: "sentiment-analyzer",
    free_name: "sentiment-analyzer-free",
    description: "Keyword sentiment scoring and phrase extraction",
    default_port: 8000,
    port_env: None,
};

pub const TRANSLATION_SERVICE: AppProfile = AppProfile {
    name: "translation-service",
    free_name: "translation-service-free",
    description: "Dictionary translation and language detection",
    default_port: 3000,
    port_env: Some("PORT"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// YAML config file; flags below override its values.
    #[arg(long, env = "OPENMESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Full listen address. Takes precedence over `--port`.
    #[arg(long, env = "OPENMESH_BIND")]
    pub bind: Option<SocketAddr>,

    /// Listen port on 0.0.0.0.
    #[arg(long)]
    pub port: Option<u16>,

    /// Where to write the manifest on startup.
    #[arg(long, env = "OPENMESH_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Do not write a manifest file.
    #[arg(long, conflicts_with = "manifest")]
    pub no_manifest: bool,

    /// Serve tools without requiring payment.
    #[arg(long, env = "OPENMESH_FREE")]
    pub free: bool,

    /// Price per call in whole asset units.
    #[arg(long, env = "OPENMESH_X402_AMOUNT")]
    pub amount: Option<String>,

    #[arg(long, env = "OPENMESH_X402_ASSET")]
    pub asset: Option<String>,

    #[arg(long, env = "OPENMESH_X402_NETWORK")]
    pub network: Option<String>,

    /// Address receiving payments.
    #[arg(long, env = "OPENMESH_X402_RECIPIENT")]
    pub recipient: Option<String>,

    /// Remote facilitator for `/verify` and `/settle`. Without one payments are checked locally.
    #[arg(long, env = "OPENMESH_X402_FACILITATOR_URL")]
    pub facilitator_url: Option<String>,

    /// Per call timeout in seconds (0 disables).
    #[arg(long, env = "OPENMESH_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Log level or filter directive; `RUST_LOG` wins when set.
    #[arg(long, env = "OPENMESH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "OPENMESH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl ServeArgs {
    fn has_x402_overrides(&self) -> bool {
        self.amount.is_some()
            || self.asset.is_some()
            || self.network.is_some()
            || self.recipient.is_some()
            || self.facilitator_url.is_some()
    }
}

/// Install the global tracing subscriber (logs go to stderr).
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already installed.
pub fn init_tracing(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Resolve the server config from the profile defaults, an optional file and flags.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, the port variable is not a number,
/// or the result fails validation.
pub fn build_config(profile: &AppProfile, args: &ServeArgs) -> anyhow::Result<MeshConfig> {
    let env_port = match profile.port_env {
        Some(var) => match std::env::var(var) {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u16>()
                    .with_context(|| format!("{var} must be a port number, got '{raw}'"))?,
            ),
            _ => None,
        },
        None => None,
    };
    resolve_config(profile, args, env_port)
}

fn resolve_config(
    profile: &AppProfile,
    args: &ServeArgs,
    env_port: Option<u16>,
) -> anyhow::Result<MeshConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let mut config = MeshConfig::new(if args.free {
                profile.free_name
            } else {
                profile.name
            });
            config.description = Some(profile.description.to_string());
            config.bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), profile.default_port);
            if !args.free {
                config.x402 = Some(default_x402());
            }
            config
        }
    };

    if let Some(bind) = args.bind {
        config.bind = bind;
    } else if let Some(port) = args.port.or(env_port) {
        config.bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    }

    if args.no_manifest {
        config.manifest_path = None;
    } else if let Some(path) = &args.manifest {
        config.manifest_path = Some(path.clone());
    }

    if let Some(secs) = args.call_timeout_secs {
        config.call_timeout_secs = secs;
    }

    if args.free {
        config.x402 = None;
    } else if args.has_x402_overrides() {
        let x402 = config.x402.get_or_insert_with(default_x402);
        if let Some(v) = &args.amount {
            x402.amount.clone_from(v);
        }
        if let Some(v) = &args.asset {
            x402.asset.clone_from(v);
        }
        if let Some(v) = &args.network {
            x402.network.clone_from(v);
        }
        if let Some(v) = &args.recipient {
            x402.recipient.clone_from(v);
        }
        if let Some(v) = &args.facilitator_url {
            x402.facilitator_url = Some(v.clone());
        }
    }

    config.validate().context("invalid server config")?;
    Ok(config)
}

fn default_x402() -> X402Config {
    X402Config {
        amount: DEFAULT_AMOUNT.to_string(),
        asset: DEFAULT_ASSET.to_string(),
        network: DEFAULT_NETWORK.to_string(),
        recipient: DEFAULT_RECIPIENT.to_string(),
        facilitator_url: None,
        description: None,
        max_timeout_seconds: openmesh_server::config::DEFAULT_MAX_TIMEOUT_SECONDS,
        decimals: None,
    }
}

/// Build the server for `profile`, register its tools and serve until Ctrl-C / SIGTERM.
///
/// # Errors
///
/// Returns an error if configuration, registration or serving fails.
pub async fn run(
    profile: &AppProfile,
    args: &ServeArgs,
    register: fn(MeshServer) -> openmesh_server::Result<MeshServer>,
) -> anyhow::Result<()> {
    let config = build_config(profile, args)?;
    tracing::info!(
        name = %config.name,
        bind = %config.bind,
        paid = config.is_paid(),
        "starting MCP server"
    );

    let server = register(MeshServer::new(config).context("invalid server config")?)
        .context("failed to register tools")?;
    server
        .serve(shutdown_signal())
        .await
        .context("server exited with an error")
}
