//! Plan Resolution
//!
//! Recovers the plan selection and payer identity for a checkout attempt:
//! the navigation payload wins, the cached pending plan is the fallback,
//! and anything else means the attempt cannot start. A cached payload
//! that fails to parse is discarded with a warning rather than aborting
//! the attempt.

use checkout_core::{Currency, Plan, Result};

use crate::cache::CheckoutCache;

/// Typed cross-navigation handoff carried into checkout
#[derive(Clone, Debug)]
pub struct PendingCheckout {
    pub plan: Plan,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl PendingCheckout {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            email: None,
            name: None,
        }
    }
}

/// A fully resolved checkout: the plan plus everything the charge needs
#[derive(Clone, Debug)]
pub struct ResolvedCheckout {
    pub plan: Plan,
    pub currency: Currency,
    pub email: String,
    pub name: String,
    pub user_id: String,
}

/// Resolve a checkout attempt
///
/// `Ok(None)` means unresolved: no navigation payload and no usable cached
/// plan; the caller redirects to plan selection. An unsupported currency
/// on a resolved plan is an error — the attempt must not proceed at a
/// made-up exchange rate.
pub fn resolve(
    navigation: Option<PendingCheckout>,
    cache: &dyn CheckoutCache,
) -> Result<Option<ResolvedCheckout>> {
    let (plan, nav_email, nav_name) = match navigation {
        Some(pending) => (Some(pending.plan), pending.email, pending.name),
        None => match cache.load_pending_plan() {
            Ok(stored) => (stored, None, None),
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed pending plan");
                (None, None, None)
            }
        },
    };

    let Some(plan) = plan else {
        return Ok(None);
    };

    let currency = plan.charge_currency()?;
    let email = nav_email
        .or_else(|| cache.user_email())
        .unwrap_or_default();
    let name = nav_name.or_else(|| cache.user_name()).unwrap_or_default();
    let user_id = cache.user_id().unwrap_or_default();

    Ok(Some(ResolvedCheckout {
        plan,
        currency,
        email,
        name,
        user_id,
    }))
}
