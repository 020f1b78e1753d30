//! x402 micropayments: price resolution, payment verification and settlement.
//!
//! Only the `exact` scheme of x402 v1 is supported. Signature checks and settlement are
//! delegated to a [`Facilitator`].

pub mod facilitator;
pub mod paygate;
pub mod price;
pub mod types;

pub use facilitator::{Facilitator, HttpFacilitator, LocalFacilitator};
pub use paygate::{Paygate, VerifiedPayment};
pub use price::PriceTag;
pub use types::{
    PaymentPayload, PaymentRequiredResponse, PaymentRequirements, SettleResponse,
    X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER, X402_VERSION,
};
