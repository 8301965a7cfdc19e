//! # checkout-flow
//!
//! The payment-to-entitlement pipeline: plan resolution, the checkout
//! state machine, the durable checkout cache, and entitlement
//! propagation.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐    ┌───────────────┐    ┌────────────┐    ┌────────────┐
//! │ Resolver │───▶│ Create intent │───▶│  Confirm   │───▶│  Persist   │
//! │ (plan +  │    │   (backend)   │    │ (processor)│    │ + propagate│
//! │ identity)│    └───────────────┘    └────────────┘    └────────────┘
//! └──────────┘          retry safe       retry safe        idempotent
//! ```
//!
//! Intent creation and confirmation are safe to retry with a fresh
//! submission. Persistence runs after the charge is captured, so its
//! failure is a distinct recoverable state (`CapturedUnrecorded`) rather
//! than a generic error; the profile sync afterwards is best-effort and
//! never blocks completion.

pub mod cache;
pub mod entitlements;
pub mod flow;
pub mod mock;
pub mod navigator;
pub mod resolver;

pub use cache::{CheckoutCache, MemoryCheckoutCache};
pub use entitlements::{EntitlementPropagator, LoggingPropagator, PurchaseSummary};
pub use flow::{CheckoutFlow, CheckoutState, FlowConfig};
pub use navigator::{Navigator, DASHBOARD_ROUTE, PLAN_SELECTION_ROUTE};
pub use resolver::{resolve, PendingCheckout, ResolvedCheckout};
