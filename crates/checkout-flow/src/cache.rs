//! Checkout Cache
//!
//! Typed abstraction over the key-value state that survives navigation:
//! the pending plan handoff, the signed-in identity, the auth token, and
//! the four entitlement counters. Counter writes overwrite; they never
//! accumulate.

use std::collections::HashMap;
use std::sync::RwLock;

use checkout_core::{CreditAllocation, Plan, Result};

/// Store keys, fixed by the upstream contract
pub mod keys {
    pub const PENDING_PLAN: &str = "pendingUpgradePlan";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_NAME: &str = "userName";
    pub const USER_ID: &str = "userId";
    pub const AUTH_TOKEN: &str = "token";
    pub const SMS_CREDITS: &str = "totalSMSCredits";
    pub const WHATSAPP_CREDITS: &str = "totalWhatsAppCredits";
    pub const EMAIL_SENDS: &str = "totalEmails";
    pub const EMAIL_VERIFICATIONS: &str = "emailVerificationCredits";
}

/// Durable checkout-side state
pub trait CheckoutCache: Send + Sync {
    /// Deserialize the pending plan; `Ok(None)` when nothing is stored,
    /// `Err` when the stored payload does not parse
    fn load_pending_plan(&self) -> Result<Option<Plan>>;

    /// Serialize and store a pending plan
    fn store_pending_plan(&self, plan: &Plan) -> Result<()>;

    /// Drop the pending plan after a completed purchase
    fn clear_pending_plan(&self);

    fn user_email(&self) -> Option<String>;
    fn user_name(&self) -> Option<String>;
    fn user_id(&self) -> Option<String>;
    fn auth_token(&self) -> Option<String>;

    /// Overwrite all four entitlement counters with a fresh allocation
    fn write_entitlements(&self, allocation: &CreditAllocation);

    /// Current counter values, zero for anything unset or unparseable
    fn entitlements(&self) -> CreditAllocation;
}

/// In-memory cache (for tests and single-process runs)
pub struct MemoryCheckoutCache {
    values: RwLock<HashMap<String, String>>,
}

impl Default for MemoryCheckoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCheckoutCache {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Raw insert; used for seeding identity and in tests
    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.values.write().unwrap().insert(key.to_string(), value.into());
    }

    /// Raw read
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn counter(&self, key: &str) -> u64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }
}

impl CheckoutCache for MemoryCheckoutCache {
    fn load_pending_plan(&self) -> Result<Option<Plan>> {
        match self.get(keys::PENDING_PLAN) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn store_pending_plan(&self, plan: &Plan) -> Result<()> {
        let raw = serde_json::to_string(plan)?;
        self.insert(keys::PENDING_PLAN, raw);
        Ok(())
    }

    fn clear_pending_plan(&self) {
        self.values.write().unwrap().remove(keys::PENDING_PLAN);
    }

    fn user_email(&self) -> Option<String> {
        self.get(keys::USER_EMAIL)
    }

    fn user_name(&self) -> Option<String> {
        self.get(keys::USER_NAME)
    }

    fn user_id(&self) -> Option<String> {
        self.get(keys::USER_ID)
    }

    fn auth_token(&self) -> Option<String> {
        self.get(keys::AUTH_TOKEN)
    }

    fn write_entitlements(&self, allocation: &CreditAllocation) {
        let mut values = self.values.write().unwrap();
        values.insert(keys::SMS_CREDITS.into(), allocation.sms_credits.to_string());
        values.insert(
            keys::WHATSAPP_CREDITS.into(),
            allocation.whatsapp_credits.to_string(),
        );
        values.insert(
            keys::EMAIL_SENDS.into(),
            allocation.email_send_credits.to_string(),
        );
        values.insert(
            keys::EMAIL_VERIFICATIONS.into(),
            allocation.email_verification_credits.to_string(),
        );
    }

    fn entitlements(&self) -> CreditAllocation {
        CreditAllocation {
            email_verification_credits: self.counter(keys::EMAIL_VERIFICATIONS),
            email_send_credits: self.counter(keys::EMAIL_SENDS),
            sms_credits: self.counter(keys::SMS_CREDITS),
            whatsapp_credits: self.counter(keys::WHATSAPP_CREDITS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        serde_json::from_str(r#"{"planName": "Growth", "emailSends": 1000}"#).unwrap()
    }

    #[test]
    fn test_pending_plan_round_trip() {
        let cache = MemoryCheckoutCache::new();
        cache.store_pending_plan(&sample_plan()).unwrap();

        let loaded = cache.load_pending_plan().unwrap().unwrap();
        assert_eq!(loaded.plan_name, "Growth");

        cache.clear_pending_plan();
        assert!(cache.load_pending_plan().unwrap().is_none());
    }

    #[test]
    fn test_malformed_pending_plan_is_an_error() {
        let cache = MemoryCheckoutCache::new();
        cache.insert(keys::PENDING_PLAN, "{not valid json");
        assert!(cache.load_pending_plan().is_err());
    }

    #[test]
    fn test_entitlements_overwrite_previous_counters() {
        let cache = MemoryCheckoutCache::new();
        cache.insert(keys::EMAIL_SENDS, "250");
        cache.insert(keys::SMS_CREDITS, "40");

        cache.write_entitlements(&CreditAllocation {
            email_verification_credits: 500,
            email_send_credits: 1000,
            sms_credits: 0,
            whatsapp_credits: 0,
        });

        let counters = cache.entitlements();
        assert_eq!(counters.email_send_credits, 1000);
        assert_eq!(counters.email_verification_credits, 500);
        assert_eq!(counters.sms_credits, 0);
        assert_eq!(counters.whatsapp_credits, 0);
    }
}
