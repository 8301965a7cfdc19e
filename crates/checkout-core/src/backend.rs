//! Billing Backend Seam
//!
//! Request/response contracts for the three backend operations the
//! pipeline drives: intent creation, payment persistence, and the
//! best-effort profile update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Provider tag sent with every charge and payment record
pub const PROVIDER: &str = "Stripe";

/// Body of an intent-creation request; built fresh per attempt, never
/// persisted
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    /// Converted charge amount, already rounded to two decimals
    pub amount: Decimal,
    pub email: String,
    pub user_id: String,
    pub plan_name: String,
    /// The billing period tag, as the backend expects it
    pub plan_type: String,
    pub provider: String,
    pub contacts: u64,
    /// Lowercase ISO code
    pub currency: String,
}

/// Backend response to intent creation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentHandle {
    pub transaction_id: String,
    pub client_secret: String,
}

/// The payment record persisted after a captured charge
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPayment {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub transaction_id: String,
    pub plan_name: String,
    pub plan_type: String,
    pub provider: String,

    // All four counters travel; the backend stores whichever are non-zero
    pub email_verification_credits: u64,
    pub email_send_credits: u64,
    pub sms_credits: u64,
    pub whatsapp_credits: u64,

    pub amount: Decimal,
    pub currency: String,
    /// amount minus discount
    pub plan_price: Decimal,
    pub discount: Decimal,
    pub payment_method: String,
    pub card_last4: String,
    pub billing_address: String,
    pub payment_date: DateTime<Utc>,
    /// Processor-reported status at capture time
    pub status: String,
}

impl PersistedPayment {
    /// Idempotency key for the save operation, derived from the processor
    /// transaction id so a retry after a captured charge is safe
    pub fn idempotency_key(&self) -> String {
        format!("save-payment-{}", self.transaction_id)
    }
}

/// Body of the best-effort profile update
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub plan_name: String,
    pub contact_limit: u64,
    pub email_limit: u64,
}

/// Billing backend consumed by the orchestrator
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Create a charge intent; no external payment side effects yet
    async fn create_payment_intent(&self, charge: &ChargeRequest) -> Result<PaymentIntentHandle>;

    /// Persist a captured payment
    async fn save_payment(&self, payment: &PersistedPayment) -> Result<()>;

    /// Update plan limits on the user profile; callers tolerate failure
    async fn update_user_plan(&self, token: &str, update: &PlanUpdate) -> Result<()>;
}
