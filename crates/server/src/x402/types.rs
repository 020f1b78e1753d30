//! x402 v1 wire types (`exact` scheme, EIP-3009 authorizations).

use crate::error::{MeshError, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const X402_VERSION: u8 = 1;
pub const SCHEME_EXACT: &str = "exact";
pub const X_PAYMENT_HEADER: &str = "x-payment";
pub const X_PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// One accepted way to pay for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Atomic token units, as a decimal string.
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Body of a `402 Payment Required` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    pub x402_version: u8,
    pub error: String,
    pub accepts: Vec<PaymentRequirements>,
}

/// Decoded `X-PAYMENT` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub payload: ExactEvmPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEvmPayload {
    pub signature: String,
    pub authorization: TransferAuthorization,
}

/// EIP-3009 `transferWithAuthorization` parameters. Numbers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAuthorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

impl PaymentPayload {
    /// Decode a base64 `X-PAYMENT` header value.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Payment`] if the value is not base64 or not a payload.
    pub fn from_header(value: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(value.trim())
            .map_err(|e| MeshError::Payment(format!("X-PAYMENT is not valid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MeshError::Payment(format!("X-PAYMENT is not a valid payload: {e}")))
    }

    /// Encode as a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to serialize.
    pub fn to_header(&self) -> Result<String> {
        encode_header(self)
    }
}

/// Request body for facilitator `/verify` and `/settle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    pub x402_version: u8,
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

/// Settlement outcome; echoed to the client in `X-PAYMENT-RESPONSE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl SettleResponse {
    /// Encode as an `X-PAYMENT-RESPONSE` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the response fails to serialize.
    pub fn to_header(&self) -> Result<String> {
        encode_header(self)
    }
}

fn encode_header<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_header_uses_camel_case_fields() {
        let raw = json!({
            "x402Version": 1,
            "scheme": "exact",
            "network": "base",
            "payload": {
                "signature": "0xsig",
                "authorization": {
                    "from": "0xaaa",
                    "to": "0xbbb",
                    "value": "1000",
                    "validAfter": "0",
                    "validBefore": "9999999999",
                    "nonce": "0x01"
                }
            }
        });
        let header = base64::engine::general_purpose::STANDARD.encode(raw.to_string());
        let payload = PaymentPayload::from_header(&header).expect("decode");
        assert_eq!(payload.payload.authorization.valid_before, "9999999999");
        assert_eq!(payload.to_header().expect("encode"), header_of(&payload));
    }

    fn header_of(p: &PaymentPayload) -> String {
        base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(p).expect("json"))
    }

    #[test]
    fn garbage_header_is_a_payment_error() {
        let err = PaymentPayload::from_header("%%%").expect_err("not base64");
        assert!(matches!(err, MeshError::Payment(_)));

        let not_json = base64::engine::general_purpose::STANDARD.encode("hello");
        let err = PaymentPayload::from_header(&not_json).expect_err("not json");
        assert!(err.to_string().contains("not a valid payload"));
    }
}
