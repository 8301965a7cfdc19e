//! # checkout-gateway
//!
//! HTTP implementations of the checkout collaborator seams:
//!
//! - [`HttpBillingApi`] — the billing backend (intent creation, payment
//!   persistence with an idempotency key, best-effort plan update)
//! - [`StripeGateway`] — client-secret card confirmation against the
//!   processor's REST surface
//!
//! Both carry a client-side timeout so a hung request fails the attempt
//! instead of leaving the flow stuck behind a disabled submit control.

mod backend;
mod config;
mod stripe;

pub use backend::HttpBillingApi;
pub use config::{BackendConfig, ProcessorConfig};
pub use stripe::StripeGateway;
