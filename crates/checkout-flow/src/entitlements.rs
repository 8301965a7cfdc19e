//! Entitlement Propagation
//!
//! Seam for pushing a confirmed purchase into in-application user state,
//! so the UI reflects the new allowances without a profile reload.

use checkout_core::CreditAllocation;

/// What a completed purchase granted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub plan_name: String,
    pub emails: u64,
    pub verifications: u64,
    pub sms: u64,
    pub whatsapp: u64,
}

impl PurchaseSummary {
    pub fn new(plan_name: impl Into<String>, allocation: &CreditAllocation) -> Self {
        Self {
            plan_name: plan_name.into(),
            emails: allocation.email_send_credits,
            verifications: allocation.email_verification_credits,
            sms: allocation.sms_credits,
            whatsapp: allocation.whatsapp_credits,
        }
    }
}

/// In-application state initializer, invoked once per successful purchase
pub trait EntitlementPropagator: Send + Sync {
    fn purchase_completed(&self, summary: &PurchaseSummary);
}

/// Propagator that only logs; useful where no application state exists
pub struct LoggingPropagator;

impl EntitlementPropagator for LoggingPropagator {
    fn purchase_completed(&self, summary: &PurchaseSummary) {
        tracing::info!(
            plan = %summary.plan_name,
            emails = summary.emails,
            verifications = summary.verifications,
            sms = summary.sms,
            whatsapp = summary.whatsapp,
            "purchase entitlements propagated"
        );
    }
}
