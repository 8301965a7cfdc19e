//! # checkout-core
//!
//! Domain layer for the checkout pipeline: the plan model, fixed-table
//! currency conversion, credit-bundle classification, and the trait seams
//! for the two external collaborators (payment gateway and billing
//! backend).
//!
//! Everything here is pure and deterministic; I/O lives behind the traits
//! and is implemented elsewhere (HTTP in `checkout-gateway`, mocks in
//! `checkout-flow`).

pub mod backend;
pub mod credits;
pub mod error;
pub mod gateway;
pub mod money;
pub mod plan;

pub use backend::{BillingApi, ChargeRequest, PaymentIntentHandle, PersistedPayment, PlanUpdate};
pub use credits::{classify, CreditAllocation, PlanCategory};
pub use error::{CheckoutError, Result};
pub use gateway::{
    BillingDetails, CardDetails, PaymentConfirmation, PaymentGateway, PostalAddress,
};
pub use money::Currency;
pub use plan::{BillingPeriod, Plan};
