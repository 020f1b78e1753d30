//! `manifest.yaml`: the server's self-description, written on startup and served at
//! `GET /manifest`.

use crate::config::MeshConfig;
use crate::error::{MeshError, Result};
use crate::x402::PriceTag;
use chrono::{DateTime, Utc};
use rmcp::model::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Digest as _;
use std::path::Path;

pub const PROTOCOL: &str = "mcp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub protocol: String,
    pub endpoints: Endpoints,
    pub pricing: Pricing,
    pub tools: Vec<ManifestTool>,
    /// SHA-256 of the canonicalized tool list.
    pub tools_hash: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub list: String,
    pub call: String,
    pub mcp: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            list: "/tools/list".to_string(),
            call: "/tools/call".to_string(),
            mcp: "/mcp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Pricing {
    Free,
    X402 {
        scheme: String,
        amount: String,
        asset: String,
        network: String,
        recipient: String,
        /// `amount` in atomic token units.
        max_amount_required: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl From<&Tool> for ManifestTool {
    fn from(t: &Tool) -> Self {
        Self {
            name: t.name.to_string(),
            description: t.description.as_deref().map(str::to_string),
            input_schema: Value::Object(t.input_schema.as_ref().clone()),
            output_schema: t
                .output_schema
                .as_ref()
                .map(|s| Value::Object(s.as_ref().clone())),
        }
    }
}

impl Manifest {
    #[must_use]
    pub fn build(config: &MeshConfig, tools: &[Tool], price: Option<&PriceTag>) -> Self {
        let tools: Vec<ManifestTool> = tools.iter().map(ManifestTool::from).collect();
        let pricing = price.map_or(Pricing::Free, |p| Pricing::X402 {
            scheme: crate::x402::types::SCHEME_EXACT.to_string(),
            amount: p.source.amount.clone(),
            asset: p.source.asset.clone(),
            network: p.source.network.clone(),
            recipient: p.pay_to.clone(),
            max_amount_required: p.atomic_amount.to_string(),
        });
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            description: config.description.clone(),
            protocol: PROTOCOL.to_string(),
            endpoints: Endpoints::default(),
            pricing,
            tools_hash: tools_hash(&tools),
            tools,
            generated_at: Utc::now(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the manifest as YAML, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Startup`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MeshError::Startup(format!("create dir {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(path, yaml)
            .map_err(|e| MeshError::Startup(format!("write manifest {}: {e}", path.display())))?;
        Ok(())
    }
}

/// Order-independent hash of the advertised tool surface.
#[must_use]
pub fn tools_hash(tools: &[ManifestTool]) -> String {
    let mut entries: Vec<Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description.as_deref().unwrap_or_default(),
                "inputSchema": canonicalize_json(&t.input_schema),
                "outputSchema": t.output_schema.as_ref().map_or(Value::Null, canonicalize_json),
            })
        })
        .collect();
    entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    let serialized = serde_json::to_string(&canonicalize_json(&Value::Array(entries)))
        .unwrap_or_default();
    hex::encode(sha2::Sha256::digest(serialized.as_bytes()))
}

fn canonicalize_json(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_json(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::X402Config;
    use rmcp::model::JsonObject;
    use serde_json::json;
    use std::sync::Arc;

    fn tool(name: &str, schema: Value) -> Tool {
        let Value::Object(obj) = schema else {
            panic!("schema must be an object")
        };
        Tool::new(name.to_string(), format!("{name} tool"), Arc::new(obj))
    }

    #[test]
    fn tools_hash_ignores_order_and_key_order() {
        let a = tool("a", json!({ "type": "object", "properties": { "x": {}, "y": {} } }));
        let b = tool("b", json!({ "properties": { "y": {}, "x": {} }, "type": "object" }));
        let b_reordered = tool("b", json!({ "type": "object", "properties": { "x": {}, "y": {} } }));

        let h1 = tools_hash(&[ManifestTool::from(&a), ManifestTool::from(&b)]);
        let h2 = tools_hash(&[ManifestTool::from(&b_reordered), ManifestTool::from(&a)]);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let c = Tool::new("c", "", Arc::new(JsonObject::new()));
        assert_ne!(h1, tools_hash(&[ManifestTool::from(&a), ManifestTool::from(&c)]));
    }

    #[test]
    fn free_manifest_roundtrips_through_yaml_file() {
        let cfg = MeshConfig::new("sentiment-analyzer-free");
        let m = Manifest::build(&cfg, &[tool("sentiment", json!({ "type": "object" }))], None);
        assert_eq!(m.pricing, Pricing::Free);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("manifest.yaml");
        m.write_to(&path).expect("write");

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("mode: free"));
        assert!(raw.contains("list: /tools/list"));
        let back: Manifest = serde_yaml::from_str(&raw).expect("parse");
        assert_eq!(back, m);
    }

    #[test]
    fn paid_manifest_lists_x402_pricing() {
        let x = X402Config {
            amount: "0.001".to_string(),
            asset: "USDC".to_string(),
            network: "base-mainnet".to_string(),
            recipient: "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb4".to_string(),
            facilitator_url: None,
            description: None,
            max_timeout_seconds: 60,
            decimals: None,
        };
        let price = PriceTag::from_config(&x).expect("price");
        let cfg = MeshConfig::new("sentiment-analyzer").with_x402(x);
        let m = Manifest::build(&cfg, &[], Some(&price));

        let v = serde_json::to_value(&m).expect("json");
        assert_eq!(v["pricing"]["mode"], "x402");
        assert_eq!(v["pricing"]["amount"], "0.001");
        assert_eq!(v["pricing"]["network"], "base-mainnet");
        assert_eq!(v["pricing"]["maxAmountRequired"], "1000");
    }
}
