//! Turning an `x402` config block into concrete payment requirements.

use super::types::{PaymentRequirements, SCHEME_EXACT};
use crate::config::X402Config;
use crate::error::{MeshError, Result};
use serde_json::json;

/// A known token deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    pub network: &'static str,
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u32,
    /// EIP-712 domain name/version of the token contract.
    pub eip712_name: &'static str,
    pub eip712_version: &'static str,
}

const USDC_DEPLOYMENTS: &[TokenDeployment] = &[
    TokenDeployment {
        network: "base",
        symbol: "USDC",
        address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        decimals: 6,
        eip712_name: "USD Coin",
        eip712_version: "2",
    },
    TokenDeployment {
        network: "base-sepolia",
        symbol: "USDC",
        address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
        decimals: 6,
        eip712_name: "USDC",
        eip712_version: "2",
    },
    TokenDeployment {
        network: "avalanche",
        symbol: "USDC",
        address: "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E",
        decimals: 6,
        eip712_name: "USD Coin",
        eip712_version: "2",
    },
    TokenDeployment {
        network: "avalanche-fuji",
        symbol: "USDC",
        address: "0x5425890298aed601595a70AB815c96711a31Bc65",
        decimals: 6,
        eip712_name: "USD Coin",
        eip712_version: "2",
    },
    TokenDeployment {
        network: "polygon",
        symbol: "USDC",
        address: "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
        decimals: 6,
        eip712_name: "USD Coin",
        eip712_version: "2",
    },
    TokenDeployment {
        network: "polygon-amoy",
        symbol: "USDC",
        address: "0x41E94Eb019C0762f9Bfcf9Fb1E58725BfB0e7582",
        decimals: 6,
        eip712_name: "USDC",
        eip712_version: "2",
    },
];

/// Map config network names to x402 network identifiers.
///
/// `base-mainnet` and friends are accepted as aliases of the bare chain name.
#[must_use]
pub fn normalize_network(network: &str) -> String {
    let n = network.trim().to_ascii_lowercase();
    match n.as_str() {
        "base-mainnet" | "base" => "base".to_string(),
        "avalanche-mainnet" | "avalanche" => "avalanche".to_string(),
        "polygon-mainnet" | "polygon" => "polygon".to_string(),
        _ => n,
    }
}

#[must_use]
pub fn find_deployment(network: &str, symbol: &str) -> Option<&'static TokenDeployment> {
    USDC_DEPLOYMENTS
        .iter()
        .find(|d| d.network == network && d.symbol.eq_ignore_ascii_case(symbol))
}

/// Parse a decimal amount (`"0.001"`) into atomic units for a token with `decimals`.
///
/// # Errors
///
/// Returns [`MeshError::Config`] for malformed input, zero, overflow, or more fractional digits
/// than the token supports.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<u128> {
    let bad = |why: &str| MeshError::Config(format!("invalid x402 amount '{amount}': {why}"));

    let s = amount.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(bad("empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad("expected a non-negative decimal number"));
    }
    let frac = frac.trim_end_matches('0');
    let frac_len = u32::try_from(frac.len()).map_err(|_| bad("too many digits"))?;
    if frac_len > decimals {
        return Err(bad(&format!("token supports at most {decimals} decimal places")));
    }

    let scale = 10u128
        .checked_pow(decimals)
        .ok_or_else(|| bad("unsupported decimals"))?;
    let whole_units: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| bad("too large"))?
    };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse().map_err(|_| bad("too large"))?
    };

    let total = whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| bad("too large"))?;
    if total == 0 {
        return Err(bad("must be greater than zero"));
    }
    Ok(total)
}

/// Resolved price for every gated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTag {
    pub network: String,
    pub asset: String,
    pub decimals: u32,
    pub atomic_amount: u128,
    pub pay_to: String,
    pub description: String,
    pub max_timeout_seconds: u64,
    pub eip712: Option<(String, String)>,
    /// The config block this tag was built from (for the manifest).
    pub source: X402Config,
}

impl PriceTag {
    /// Resolve a config block.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] if the asset is an unknown symbol for the network, a raw
    /// address without `decimals`, or the amount is invalid.
    pub fn from_config(cfg: &X402Config) -> Result<Self> {
        let network = normalize_network(&cfg.network);
        let asset_in = cfg.asset.trim();

        let (asset, decimals, eip712) = if asset_in.starts_with("0x") {
            let decimals = cfg.decimals.ok_or_else(|| {
                MeshError::Config(format!(
                    "x402.decimals is required when asset is a contract address ({asset_in})"
                ))
            })?;
            (asset_in.to_string(), decimals, None)
        } else {
            let d = find_deployment(&network, asset_in).ok_or_else(|| {
                MeshError::Config(format!(
                    "unknown x402 asset '{asset_in}' on network '{network}'"
                ))
            })?;
            (
                d.address.to_string(),
                cfg.decimals.unwrap_or(d.decimals),
                Some((d.eip712_name.to_string(), d.eip712_version.to_string())),
            )
        };

        let atomic_amount = parse_amount(&cfg.amount, decimals)?;

        Ok(Self {
            network,
            asset,
            decimals,
            atomic_amount,
            pay_to: cfg.recipient.trim().to_string(),
            description: cfg
                .description
                .clone()
                .unwrap_or_else(|| "Paid MCP tool call".to_string()),
            max_timeout_seconds: cfg.max_timeout_seconds,
            eip712,
            source: cfg.clone(),
        })
    }

    /// Requirements for one resource URL.
    #[must_use]
    pub fn requirements(&self, resource: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: SCHEME_EXACT.to_string(),
            network: self.network.clone(),
            max_amount_required: self.atomic_amount.to_string(),
            resource: resource.to_string(),
            description: self.description.clone(),
            mime_type: "application/json".to_string(),
            pay_to: self.pay_to.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset.clone(),
            output_schema: None,
            extra: self
                .eip712
                .as_ref()
                .map(|(name, version)| json!({ "name": name, "version": version })),
        }
    }
}
