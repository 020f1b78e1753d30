//! HTTP surface: REST tool endpoints, JSON-RPC `/mcp`, health and manifest.

mod call;
mod mcp;
mod rest;

use crate::manifest::Manifest;
use crate::registry::ToolRegistry;
use crate::x402::Paygate;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub(crate) struct AppStateInner {
    pub name: String,
    pub version: String,
    pub registry: ToolRegistry,
    pub paygate: Option<Arc<Paygate>>,
    pub manifest: Manifest,
    pub call_timeout: Option<Duration>,
    /// Used for the x402 `resource` when the request has no `Host` header.
    pub fallback_host: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        name: String,
        version: String,
        registry: ToolRegistry,
        paygate: Option<Arc<Paygate>>,
        manifest: Manifest,
        call_timeout: Option<Duration>,
        fallback_host: String,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                name,
                version,
                registry,
                paygate,
                manifest,
                call_timeout,
                fallback_host,
            }),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/manifest", get(manifest))
        .route("/tools/list", get(rest::list_tools).post(rest::list_tools))
        .route("/tools/call", post(rest::call_tool))
        .route("/mcp", post(mcp::handle))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": state.inner.name,
        "version": state.inner.version,
        "paid": state.inner.paygate.is_some(),
        "tools": state.inner.registry.len(),
    }))
}

async fn manifest(State(state): State<AppState>) -> Response {
    match state.inner.manifest.to_yaml() {
        Ok(yaml) => ([(header::CONTENT_TYPE, "application/yaml")], yaml).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Absolute URL of the current request, used as the x402 `resource`.
pub(crate) fn resource_url(headers: &HeaderMap, uri: &Uri, fallback_host: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(fallback_host);
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .filter(|p| *p == "https" || *p == "http")
        .unwrap_or("http");
    format!("{scheme}://{host}{}", uri.path())
}

#[cfg(test)]
mod tests {
    use super::resource_url;
    use axum::http::{HeaderMap, HeaderValue, Uri};

    #[test]
    fn resource_url_prefers_host_and_forwarded_proto() {
        let uri: Uri = "/tools/call?x=1".parse().expect("uri");
        let mut headers = HeaderMap::new();
        assert_eq!(
            resource_url(&headers, &uri, "0.0.0.0:8000"),
            "http://0.0.0.0:8000/tools/call"
        );

        headers.insert("host", HeaderValue::from_static("mesh.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(
            resource_url(&headers, &uri, "0.0.0.0:8000"),
            "https://mesh.example/tools/call"
        );
    }
}
