//! `/tools/list` and `/tools/call`.

use super::call::{GatedCallError, gated_call};
use super::{AppState, error_response, resource_url};
use crate::error::MeshError;
use crate::x402::X_PAYMENT_RESPONSE_HEADER;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub(crate) struct CallToolRequest {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub(super) async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.inner.registry.list() }))
}

pub(super) async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    payload: Result<Json<CallToolRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let resource = resource_url(&headers, &uri, &state.inner.fallback_host);
    tracing::info!(tool = %request.name, "tools/call");

    match gated_call(&state, &headers, &resource, &request.name, request.arguments).await {
        Ok(call) => {
            let mut resp = Json(call.result).into_response();
            if let Some(h) = call.payment_response
                && let Ok(v) = HeaderValue::from_str(&h)
            {
                resp.headers_mut().insert(X_PAYMENT_RESPONSE_HEADER, v);
            }
            resp
        }
        Err(e) => gated_error_response(e),
    }
}

pub(super) fn gated_error_response(err: GatedCallError) -> Response {
    match err {
        GatedCallError::PaymentRequired(body) => {
            tracing::info!(reason = %body.error, "payment required");
            (StatusCode::PAYMENT_REQUIRED, Json(*body)).into_response()
        }
        GatedCallError::Tool(e) => {
            let status = match &e {
                MeshError::ToolNotFound(_) => StatusCode::NOT_FOUND,
                MeshError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                tracing::error!(error = %e, "tool call failed");
            }
            error_response(status, e.to_string())
        }
    }
}
