//! Minimal MCP JSON-RPC endpoint (`POST /mcp`, plain JSON responses, no sessions).

use super::call::{GatedCallError, gated_call};
use super::{AppState, resource_url};
use crate::error::MeshError;
use crate::registry::error_result;
use crate::x402::X_PAYMENT_RESPONSE_HEADER;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rmcp::model::{
    CallToolRequestParams, ClientJsonRpcMessage, ClientRequest, ErrorCode, ErrorData,
    Implementation, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    JsonRpcVersion2_0, ListToolsResult, ProtocolVersion, RequestId, ServerCapabilities,
    ServerJsonRpcMessage, ServerResult,
};
use serde::Serialize;
use serde_json::Value;

/// Methods answered here; any other method is `METHOD_NOT_FOUND`.
const SUPPORTED_METHODS: [&str; 4] = ["initialize", "ping", "tools/list", "tools/call"];

pub(super) async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return unidentified_error(ErrorData::parse_error(format!("parse error: {e}"), None));
        }
    };

    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok());
    let message: ClientJsonRpcMessage = match serde_json::from_value(value) {
        Ok(m) => m,
        Err(e) => {
            let err = ErrorData::invalid_request(format!("invalid JSON-RPC message: {e}"), None);
            return match id {
                Some(id) => error_response(id, err),
                None => unidentified_error(err),
            };
        }
    };

    match message {
        ClientJsonRpcMessage::Request(JsonRpcRequest { id, request, .. }) => {
            dispatch(&state, &headers, &uri, id, request).await
        }
        // Notifications and client replies get no response body.
        _ => {
            tracing::debug!("mcp notification");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    id: RequestId,
    request: ClientRequest,
) -> Response {
    match request {
        ClientRequest::InitializeRequest(req) => {
            let result = initialize_result(state, req.params.protocol_version);
            result_response(id, ServerResult::InitializeResult(result))
        }
        ClientRequest::PingRequest(_) => result_response(id, ServerResult::empty(())),
        ClientRequest::ListToolsRequest(_) => {
            let result = ListToolsResult::with_all_items(state.inner.registry.list());
            result_response(id, ServerResult::ListToolsResult(result))
        }
        ClientRequest::CallToolRequest(req) => tools_call(state, headers, uri, id, req.params).await,
        // A known method whose params did not match its typed request.
        ClientRequest::CustomRequest(req) if SUPPORTED_METHODS.contains(&req.method.as_str()) => {
            error_response(
                id,
                ErrorData::invalid_params(format!("invalid params for {}", req.method), None),
            )
        }
        other => error_response(
            id,
            ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("method not found: {}", other.method()),
                None,
            ),
        ),
    }
}

async fn tools_call(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    id: RequestId,
    params: CallToolRequestParams,
) -> Response {
    let name = params.name.to_string();
    let arguments = params.arguments.map_or(Value::Null, Value::Object);
    let resource = resource_url(headers, uri, &state.inner.fallback_host);
    tracing::info!(tool = %name, "mcp tools/call");

    match gated_call(state, headers, &resource, &name, arguments).await {
        Ok(call) => {
            let mut resp = result_response(id, ServerResult::CallToolResult(call.result));
            if let Some(h) = call.payment_response
                && let Ok(v) = HeaderValue::from_str(&h)
            {
                resp.headers_mut().insert(X_PAYMENT_RESPONSE_HEADER, v);
            }
            resp
        }
        // x402 clients key off the HTTP status, so payment stays a plain 402 here too.
        Err(GatedCallError::PaymentRequired(body)) => {
            (StatusCode::PAYMENT_REQUIRED, Json(*body)).into_response()
        }
        Err(GatedCallError::Tool(e @ (MeshError::ToolNotFound(_) | MeshError::InvalidArguments { .. }))) => {
            error_response(id, ErrorData::invalid_params(e.to_string(), None))
        }
        Err(GatedCallError::Tool(e)) => {
            tracing::error!(tool = %name, error = %e, "tool call failed");
            result_response(id, ServerResult::CallToolResult(error_result(e.to_string())))
        }
    }
}

fn initialize_result(state: &AppState, requested: ProtocolVersion) -> InitializeResult {
    let instructions = if state.inner.paygate.is_some() {
        "Tool calls require an x402 payment (X-PAYMENT header)."
    } else {
        "Tools are free to use."
    };

    InitializeResult {
        protocol_version: requested,
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        server_info: Implementation {
            name: state.inner.name.clone(),
            title: None,
            version: state.inner.version.clone(),
            description: None,
            icons: None,
            website_url: None,
        },
        instructions: Some(instructions.to_string()),
    }
}

fn result_response(id: RequestId, result: ServerResult) -> Response {
    let msg = ServerJsonRpcMessage::Response(JsonRpcResponse {
        jsonrpc: JsonRpcVersion2_0,
        id,
        result,
    });
    Json(msg).into_response()
}

fn error_response(id: RequestId, error: ErrorData) -> Response {
    let msg = ServerJsonRpcMessage::Error(JsonRpcError {
        jsonrpc: JsonRpcVersion2_0,
        id,
        error,
    });
    Json(msg).into_response()
}

/// Error reply for a message whose `id` could not be read (`"id": null`).
#[derive(Serialize)]
struct UnidentifiedError {
    jsonrpc: JsonRpcVersion2_0,
    id: Option<RequestId>,
    error: ErrorData,
}

fn unidentified_error(error: ErrorData) -> Response {
    Json(UnidentifiedError {
        jsonrpc: JsonRpcVersion2_0,
        id: None,
        error,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshConfig;
    use crate::server::MeshServer;
    use crate::tool::tool;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct CountInput {
        text: String,
    }

    #[derive(Serialize, JsonSchema)]
    struct CountOutput {
        words: usize,
    }

    async fn post(body: &str) -> (StatusCode, Value) {
        let mut cfg = MeshConfig::new("rpc");
        cfg.manifest_path = None;
        let app = MeshServer::new(cfg)
            .expect("config")
            .tool(tool("count", "Count words", |i: CountInput| CountOutput {
                words: i.text.split_whitespace().count(),
            }))
            .expect("register")
            .router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let resp = reqwest::Client::new()
            .post(format!("http://{addr}/mcp"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("post");
        let status = resp.status();
        let text = resp.text().await.expect("body");
        server.abort();
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).expect("json body")
        };
        (StatusCode::from_u16(status.as_u16()).expect("status"), value)
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let (status, body) = post(r#"{"jsonrpc":"2.0","id":"p1","method":"ping"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "jsonrpc": "2.0", "id": "p1", "result": {} }));
    }

    #[tokio::test]
    async fn tools_call_with_malformed_params_is_invalid_params() {
        let (_, body) =
            post(r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"arguments":{}}}"#).await;
        assert_eq!(body["id"], 9);
        assert_eq!(body["error"]["code"], ErrorCode::INVALID_PARAMS.0);
    }

    #[tokio::test]
    async fn message_without_method_is_invalid_request() {
        let (_, body) = post(r#"{"jsonrpc":"2.0","id":3}"#).await;
        assert_eq!(body["error"]["code"], ErrorCode::INVALID_REQUEST.0);
    }

    #[tokio::test]
    async fn parse_error_has_null_id() {
        let (_, body) = post("{").await;
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], ErrorCode::PARSE_ERROR.0);
    }

    #[tokio::test]
    async fn tools_call_runs_tool() {
        let (_, body) = post(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"count","arguments":{"text":"one two three"}}}"#,
        )
        .await;
        assert_eq!(body["result"]["structuredContent"]["words"], 3);
        assert_eq!(body["result"]["isError"], false);
    }
}
