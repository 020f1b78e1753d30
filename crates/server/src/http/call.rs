use super::AppState;
use crate::error::MeshError;
use crate::x402::{PaymentRequiredResponse, X_PAYMENT_HEADER};
use axum::http::HeaderMap;
use rmcp::model::CallToolResult;
use serde_json::Value;

pub(crate) struct GatedCall {
    pub result: CallToolResult,
    /// Encoded `X-PAYMENT-RESPONSE` header for paid calls.
    pub payment_response: Option<String>,
}

pub(crate) enum GatedCallError {
    PaymentRequired(Box<PaymentRequiredResponse>),
    Tool(MeshError),
}

impl From<MeshError> for GatedCallError {
    fn from(e: MeshError) -> Self {
        Self::Tool(e)
    }
}

/// Run a tool call behind the paygate (if any).
///
/// Unknown tools fail before payment is requested. Failed calls are never settled and a
/// failed call or settlement frees the payment nonce again.
pub(crate) async fn gated_call(
    state: &AppState,
    headers: &HeaderMap,
    resource: &str,
    name: &str,
    arguments: Value,
) -> Result<GatedCall, GatedCallError> {
    let inner = &state.inner;
    if !inner.registry.contains(name) {
        return Err(MeshError::ToolNotFound(name.to_string()).into());
    }

    let Some(gate) = inner.paygate.as_ref() else {
        let result = inner.registry.call(name, arguments, inner.call_timeout).await?;
        return Ok(GatedCall {
            result,
            payment_response: None,
        });
    };

    let header = headers.get(X_PAYMENT_HEADER).and_then(|h| h.to_str().ok());
    let verified = gate
        .verify(header, resource)
        .await
        .map_err(|body| GatedCallError::PaymentRequired(Box::new(body)))?;

    let result = match inner.registry.call(name, arguments, inner.call_timeout).await {
        Ok(r) => r,
        Err(e) => {
            gate.release(&verified);
            return Err(e.into());
        }
    };

    let settled = match gate.settle(&verified).await {
        Ok(s) if s.success => s,
        Ok(s) => {
            gate.release(&verified);
            let reason = s
                .error_reason
                .unwrap_or_else(|| "payment settlement failed".to_string());
            return Err(GatedCallError::PaymentRequired(Box::new(
                gate.payment_required(resource, reason),
            )));
        }
        Err(e) => {
            gate.release(&verified);
            tracing::warn!(tool = %name, error = %e, "settlement error");
            return Err(GatedCallError::PaymentRequired(Box::new(
                gate.payment_required(resource, "payment settlement failed"),
            )));
        }
    };

    Ok(GatedCall {
        result,
        payment_response: settled.to_header().ok(),
    })
}
