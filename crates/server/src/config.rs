//! Server configuration.
//!
//! A config file is optional; binaries layer CLI flags and `OPENMESH_*` env vars on top of
//! whatever [`load_config`] returns.

use crate::error::{MeshError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_MANIFEST_PATH: &str = "manifest.yaml";
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshConfig {
    /// Server name; also the manifest name.
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Where the manifest is written on startup. `None` disables writing.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: Option<PathBuf>,
    /// Per tool call timeout in seconds (0 = no timeout).
    #[serde(default)]
    pub call_timeout_secs: u64,
    /// Micropayment settings. Absent = free to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x402: Option<X402Config>,
}

/// The `x402` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X402Config {
    /// Price per call in whole asset units, e.g. `"0.001"`.
    pub amount: String,
    /// Token symbol (`USDC`) or `0x` token contract address.
    pub asset: String,
    /// Network name, e.g. `base-mainnet` or `base-sepolia`.
    pub network: String,
    /// Address receiving payments.
    pub recipient: String,
    /// Remote facilitator base URL used for `/verify` and `/settle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// Token decimals; only needed when `asset` is a raw contract address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND.parse().expect("valid default bind address")
}

#[allow(clippy::unnecessary_wraps)]
fn default_manifest_path() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_MANIFEST_PATH))
}

fn default_max_timeout_seconds() -> u64 {
    DEFAULT_MAX_TIMEOUT_SECONDS
}

impl MeshConfig {
    /// A free-mode config with defaults for everything but the name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: None,
            bind: default_bind(),
            manifest_path: default_manifest_path(),
            call_timeout_secs: 0,
            x402: None,
        }
    }

    #[must_use]
    pub fn with_x402(mut self, x402: X402Config) -> Self {
        self.x402 = Some(x402);
        self
    }

    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.x402.is_some()
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] if the name is empty or the x402 block is incomplete.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MeshError::Config("name must not be empty".to_string()));
        }
        if let Some(x) = &self.x402 {
            for (key, value) in [
                ("amount", &x.amount),
                ("asset", &x.asset),
                ("network", &x.network),
                ("recipient", &x.recipient),
            ] {
                if value.trim().is_empty() {
                    return Err(MeshError::Config(format!("x402.{key} must not be empty")));
                }
            }
            if !x.recipient.starts_with("0x") {
                return Err(MeshError::Config(format!(
                    "x402.recipient must be a 0x address, got '{}'",
                    x.recipient
                )));
            }
        }
        Ok(())
    }
}

/// Load a YAML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, or fails validation.
pub fn load_config(path: &Path) -> Result<MeshConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        MeshError::Config(format!("failed to read config {}: {e}", path.display()))
    })?;
    let cfg: MeshConfig = serde_yaml::from_str(&raw)?;
    cfg.validate()?;
    Ok(cfg)
}
