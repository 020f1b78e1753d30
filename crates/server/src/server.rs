//! [`MeshServer`]: config + tools -> running HTTP server.

use crate::config::MeshConfig;
use crate::error::{MeshError, Result};
use crate::http::{self, AppState};
use crate::manifest::Manifest;
use crate::registry::ToolRegistry;
use crate::tool::ToolHandler;
use crate::x402::{Facilitator, HttpFacilitator, LocalFacilitator, Paygate, PriceTag};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const FACILITATOR_TIMEOUT: Duration = Duration::from_secs(30);

pub struct MeshServer {
    config: MeshConfig,
    registry: ToolRegistry,
    price: Option<PriceTag>,
    facilitator: Option<Arc<dyn Facilitator>>,
}

impl MeshServer {
    /// Validate `config` and resolve its x402 price and facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] if the config or its x402 block is invalid, or an error if
    /// the facilitator HTTP client cannot be built.
    pub fn new(config: MeshConfig) -> Result<Self> {
        config.validate()?;
        let price = config.x402.as_ref().map(PriceTag::from_config).transpose()?;
        let facilitator = price.as_ref().map(default_facilitator).transpose()?;
        Ok(Self {
            config,
            registry: ToolRegistry::new(),
            price,
            facilitator,
        })
    }

    /// Builder-style [`MeshServer::register`].
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] on a duplicate tool name.
    pub fn tool(mut self, handler: impl ToolHandler + 'static) -> Result<Self> {
        self.register(handler)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::Config`] on a duplicate tool name.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> Result<()> {
        self.registry.register(handler)
    }

    /// Override the facilitator chosen from config (`facilitatorUrl` or local).
    /// Has no effect on a free server.
    #[must_use]
    pub fn with_facilitator(mut self, facilitator: Arc<dyn Facilitator>) -> Self {
        if self.price.is_some() {
            self.facilitator = Some(facilitator);
        }
        self
    }

    #[must_use]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// A freshly stamped manifest for the current tool set.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::build(&self.config, &self.registry.list(), self.price.as_ref())
    }

    fn paygate(&self) -> Option<Arc<Paygate>> {
        let price = self.price.clone()?;
        let facilitator = Arc::clone(self.facilitator.as_ref()?);
        Some(Arc::new(Paygate::new(price, facilitator)))
    }

    /// Build the axum router without binding or writing the manifest.
    #[must_use]
    pub fn router(&self) -> Router {
        self.app(self.manifest(), self.paygate())
    }

    fn app(&self, manifest: Manifest, paygate: Option<Arc<Paygate>>) -> Router {
        let timeout = (self.config.call_timeout_secs > 0)
            .then(|| Duration::from_secs(self.config.call_timeout_secs));
        let state = AppState::new(
            self.config.name.clone(),
            self.config.version.clone(),
            self.registry.clone(),
            paygate,
            manifest,
            timeout,
            self.config.bind.to_string(),
        );
        http::router(state)
    }

    /// Write the manifest, bind `config.bind` and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written, the address cannot be bound, or the
    /// server fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind)
            .await
            .map_err(|e| MeshError::Startup(format!("failed to bind {}: {e}", self.config.bind)))?;
        self.serve_on(listener, shutdown).await
    }

    /// Like [`MeshServer::serve`] on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written or the server fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.registry.is_empty() {
            tracing::warn!(name = %self.config.name, "no tools registered");
        }

        let manifest = self.manifest();
        if let Some(path) = &self.config.manifest_path {
            manifest.write_to(path)?;
            tracing::info!(path = %path.display(), tools_hash = %manifest.tools_hash, "wrote manifest");
        }

        let paygate = self.paygate();
        if let Some(gate) = &paygate {
            tracing::info!(
                facilitator = gate.facilitator_kind(),
                network = %gate.price().network,
                amount = gate.price().atomic_amount,
                pay_to = %gate.price().pay_to,
                "x402 payment gate enabled"
            );
        }
        let app = self.app(manifest, paygate);

        let addr = listener.local_addr()?;
        tracing::info!(
            name = %self.config.name,
            %addr,
            tools = self.registry.len(),
            paid = self.config.is_paid(),
            "MCP server listening; exposing /tools/list, /tools/call and /mcp"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| MeshError::Runtime(format!("HTTP server error: {e}")))?;

        tracing::info!(name = %self.config.name, "server stopped");
        Ok(())
    }
}

fn default_facilitator(price: &PriceTag) -> Result<Arc<dyn Facilitator>> {
    match &price.source.facilitator_url {
        Some(url) => Ok(Arc::new(HttpFacilitator::new(url.clone(), FACILITATOR_TIMEOUT)?)),
        None => {
            tracing::warn!(
                "no x402 facilitatorUrl configured; payments are checked locally and signatures are not verified"
            );
            Ok(Arc::new(LocalFacilitator))
        }
    }
}

/// Resolves on Ctrl-C (or SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
