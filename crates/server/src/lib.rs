//! Host MCP tools over HTTP, free or behind an x402 micropayment.
//!
//! ```no_run
//! use openmesh_server::{MeshConfig, MeshServer, tool};
//! use schemars::JsonSchema;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Input { text: String }
//!
//! #[derive(Serialize, JsonSchema)]
//! struct Output { length: usize }
//!
//! # async fn run() -> openmesh_server::Result<()> {
//! let server = MeshServer::new(MeshConfig::new("text-length"))?
//!     .tool(tool("length", "Count characters", |i: Input| Output { length: i.text.chars().count() }))?;
//! server.serve(openmesh_server::shutdown_signal()).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod manifest;
pub mod registry;
pub mod server;
pub mod tool;
pub mod x402;

pub use config::{MeshConfig, X402Config, load_config};
pub use error::{MeshError, Result};
pub use manifest::Manifest;
pub use registry::ToolRegistry;
pub use server::{MeshServer, shutdown_signal};
pub use tool::{FnTool, ToolHandler, tool};
