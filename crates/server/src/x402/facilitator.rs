//! Payment verification/settlement backends.

use super::types::{
    FacilitatorRequest, PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse,
    X402_VERSION,
};
use crate::error::{MeshError, Result};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Facilitator: Send + Sync {
    /// Check that `payload` is a valid payment for `requirements`.
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse>;

    /// Execute the payment. Called only after the tool call succeeded.
    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

/// Remote facilitator speaking the x402 `/verify` + `/settle` HTTP API.
pub struct HttpFacilitator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFacilitator {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<T> {
        let body = FacilitatorRequest {
            x402_version: X402_VERSION,
            payment_payload: payload.clone(),
            payment_requirements: requirements.clone(),
        };
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MeshError::Facilitator(format!("{path} returned {status}")));
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl Facilitator for HttpFacilitator {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        self.post("/verify", payload, requirements).await
    }

    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        self.post("/settle", payload, requirements).await
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}

/// Accepts any payload the paygate's own checks let through.
///
/// Signatures are not verified and nothing moves on-chain; meant for development and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFacilitator;

#[async_trait]
impl Facilitator for LocalFacilitator {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        _requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        let signed = !payload.payload.signature.trim().is_empty();
        Ok(VerifyResponse {
            is_valid: signed,
            invalid_reason: (!signed).then(|| "missing_signature".to_string()),
            payer: Some(payload.payload.authorization.from.clone()),
        })
    }

    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        Ok(SettleResponse {
            success: true,
            error_reason: None,
            transaction: None,
            network: requirements.network.clone(),
            payer: Some(payload.payload.authorization.from.clone()),
        })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x402::types::{ExactEvmPayload, TransferAuthorization};
    use axum::{Json, Router, routing::post};
    use serde_json::{Value, json};

    fn payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: 1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: ExactEvmPayload {
                signature: "0xdeadbeef".to_string(),
                authorization: TransferAuthorization {
                    from: "0xpayer".to_string(),
                    to: "0xpayee".to_string(),
                    value: "1000".to_string(),
                    valid_after: "0".to_string(),
                    valid_before: "9999999999".to_string(),
                    nonce: "0x01".to_string(),
                },
            },
        }
    }

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            max_amount_required: "1000".to_string(),
            resource: "http://localhost/tools/call".to_string(),
            description: "test".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: "0xpayee".to_string(),
            max_timeout_seconds: 60,
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
            output_schema: None,
            extra: None,
        }
    }

    #[tokio::test]
    async fn local_facilitator_requires_a_signature() {
        let f = LocalFacilitator;
        let ok = f.verify(&payload(), &requirements()).await.expect("verify");
        assert!(ok.is_valid);
        assert_eq!(ok.payer.as_deref(), Some("0xpayer"));

        let mut unsigned = payload();
        unsigned.payload.signature = String::new();
        let bad = f.verify(&unsigned, &requirements()).await.expect("verify");
        assert!(!bad.is_valid);
        assert_eq!(bad.invalid_reason.as_deref(), Some("missing_signature"));
    }

    #[tokio::test]
    async fn http_facilitator_posts_x402_request_bodies() {
        async fn verify(Json(body): Json<Value>) -> Json<Value> {
            let amount_ok = body["paymentRequirements"]["maxAmountRequired"] == "1000"
                && body["paymentPayload"]["payload"]["authorization"]["value"] == "1000";
            Json(json!({ "isValid": amount_ok && body["x402Version"] == 1, "payer": "0xpayer" }))
        }
        async fn settle(Json(_body): Json<Value>) -> Json<Value> {
            Json(json!({ "success": true, "transaction": "0xtx", "network": "base-sepolia" }))
        }

        let app = Router::new()
            .route("/verify", post(verify))
            .route("/settle", post(settle));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let f = HttpFacilitator::new(format!("http://{addr}/"), Duration::from_secs(5))
            .expect("client");
        let verified = f.verify(&payload(), &requirements()).await.expect("verify");
        assert!(verified.is_valid);

        let settled = f.settle(&payload(), &requirements()).await.expect("settle");
        assert!(settled.success);
        assert_eq!(settled.transaction.as_deref(), Some("0xtx"));

        let _ = shutdown_tx.send(());
        server_handle
            .await
            .expect("server task join")
            .expect("server result");
    }

    #[tokio::test]
    async fn http_facilitator_surfaces_error_status() {
        let app = Router::new().route(
            "/verify",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        let f = HttpFacilitator::new(format!("http://{addr}"), Duration::from_secs(5))
            .expect("client");
        let err = f
            .verify(&payload(), &requirements())
            .await
            .expect_err("502");
        assert!(err.to_string().contains("/verify returned 502"));

        server_handle.abort();
    }
}
