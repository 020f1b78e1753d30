//! Per-call payment gate.
//!
//! Flow for a gated call:
//! 1. [`Paygate::verify`] decodes `X-PAYMENT`, runs local checks, then asks the facilitator.
//! 2. The caller runs the tool.
//! 3. On success [`Paygate::settle`] settles; on failure [`Paygate::release`] frees the nonce.

use super::facilitator::Facilitator;
use super::price::PriceTag;
use super::types::{
    PaymentPayload, PaymentRequiredResponse, PaymentRequirements, SCHEME_EXACT, SettleResponse,
    X402_VERSION,
};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A payment that passed verification and is waiting for the call outcome.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub payload: PaymentPayload,
    pub requirements: PaymentRequirements,
    pub payer: Option<String>,
}

pub struct Paygate {
    price: PriceTag,
    facilitator: Arc<dyn Facilitator>,
    /// nonce (lower-case) -> `validBefore`; entries past `validBefore` are pruned on insert.
    nonces: Mutex<HashMap<String, i64>>,
}

impl Paygate {
    #[must_use]
    pub fn new(price: PriceTag, facilitator: Arc<dyn Facilitator>) -> Self {
        Self {
            price,
            facilitator,
            nonces: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn price(&self) -> &PriceTag {
        &self.price
    }

    #[must_use]
    pub fn facilitator_kind(&self) -> &'static str {
        self.facilitator.kind()
    }

    #[must_use]
    pub fn payment_required(
        &self,
        resource: &str,
        error: impl Into<String>,
    ) -> PaymentRequiredResponse {
        PaymentRequiredResponse {
            x402_version: X402_VERSION,
            error: error.into(),
            accepts: vec![self.price.requirements(resource)],
        }
    }

    /// Verify the `X-PAYMENT` header for `resource`.
    ///
    /// # Errors
    ///
    /// Returns the 402 body to send back when the payment is missing or rejected.
    pub async fn verify(
        &self,
        header: Option<&str>,
        resource: &str,
    ) -> std::result::Result<VerifiedPayment, PaymentRequiredResponse> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Err(self.payment_required(resource, "X-PAYMENT header is required"));
        };

        let payload = PaymentPayload::from_header(header)
            .map_err(|e| self.payment_required(resource, e.to_string()))?;
        let requirements = self.price.requirements(resource);
        let now = chrono::Utc::now().timestamp();

        check_payload(&payload, &requirements, now)
            .map_err(|reason| self.payment_required(resource, reason))?;

        let verdict = match self.facilitator.verify(&payload, &requirements).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, facilitator = self.facilitator.kind(), "payment verification failed");
                return Err(self.payment_required(resource, "payment verification failed"));
            }
        };
        if !verdict.is_valid {
            let reason = verdict
                .invalid_reason
                .unwrap_or_else(|| "payment rejected".to_string());
            return Err(self.payment_required(resource, reason));
        }

        let auth = &payload.payload.authorization;
        let valid_before = auth.valid_before.parse::<i64>().unwrap_or(i64::MAX);
        if !self.claim_nonce(&auth.nonce, valid_before, now) {
            return Err(self.payment_required(resource, "payment nonce already used"));
        }

        let payer = verdict.payer.or_else(|| Some(auth.from.clone()));
        tracing::info!(payer = payer.as_deref().unwrap_or("?"), amount = %auth.value, "payment verified");
        Ok(VerifiedPayment {
            payload,
            requirements,
            payer,
        })
    }

    /// Settle a verified payment after a successful call.
    ///
    /// # Errors
    ///
    /// Returns an error if the facilitator cannot be reached.
    pub async fn settle(&self, verified: &VerifiedPayment) -> Result<SettleResponse> {
        let resp = self
            .facilitator
            .settle(&verified.payload, &verified.requirements)
            .await?;
        if resp.success {
            tracing::info!(
                payer = resp.payer.as_deref().unwrap_or("?"),
                transaction = resp.transaction.as_deref().unwrap_or("-"),
                network = %resp.network,
                "payment settled"
            );
        } else {
            tracing::warn!(reason = resp.error_reason.as_deref().unwrap_or("?"), "payment settlement failed");
        }
        Ok(resp)
    }

    /// Forget the nonce of a payment whose call failed, so the client may retry with it.
    pub fn release(&self, verified: &VerifiedPayment) {
        let nonce = verified.payload.payload.authorization.nonce.to_ascii_lowercase();
        self.nonces.lock().remove(&nonce);
    }

    fn claim_nonce(&self, nonce: &str, valid_before: i64, now: i64) -> bool {
        let key = nonce.to_ascii_lowercase();
        let mut nonces = self.nonces.lock();
        nonces.retain(|_, expires| *expires > now);
        if nonces.contains_key(&key) {
            return false;
        }
        nonces.insert(key, valid_before);
        true
    }
}

/// Checks that need no signature verification.
fn check_payload(
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    now: i64,
) -> std::result::Result<(), String> {
    if payload.x402_version != X402_VERSION {
        return Err(format!("unsupported x402Version {}", payload.x402_version));
    }
    if payload.scheme != SCHEME_EXACT {
        return Err(format!("unsupported scheme '{}'", payload.scheme));
    }
    if payload.network != requirements.network {
        return Err(format!(
            "network mismatch: expected '{}', got '{}'",
            requirements.network, payload.network
        ));
    }

    let auth = &payload.payload.authorization;
    if !auth.to.eq_ignore_ascii_case(&requirements.pay_to) {
        return Err("payment recipient does not match payTo".to_string());
    }

    let required: u128 = requirements
        .max_amount_required
        .parse()
        .map_err(|_| "invalid maxAmountRequired".to_string())?;
    let value: u128 = auth
        .value
        .parse()
        .map_err(|_| "authorization value is not an integer".to_string())?;
    if value < required {
        return Err(format!("insufficient payment: {value} < {required}"));
    }

    let valid_after: i64 = auth
        .valid_after
        .parse()
        .map_err(|_| "validAfter is not an integer".to_string())?;
    let valid_before: i64 = auth
        .valid_before
        .parse()
        .map_err(|_| "validBefore is not an integer".to_string())?;
    if now < valid_after {
        return Err("authorization is not yet valid".to_string());
    }
    if now >= valid_before {
        return Err("authorization has expired".to_string());
    }

    if auth.nonce.trim().is_empty() {
        return Err("authorization nonce is missing".to_string());
    }
    Ok(())
}
