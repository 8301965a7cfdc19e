//! Plan Model
//!
//! The externally supplied subscription plan, immutable for the duration
//! of a checkout. Serialized camelCase to match the upstream payload, with
//! optional credit-bearing fields that vary by plan category.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::money::Currency;

/// Billing cycle for a plan
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Quarterly => "quarterly",
            BillingPeriod::Yearly => "yearly",
        }
    }

    /// Unit label for per-period display ("1,000 sends/month")
    pub fn label(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "month",
            BillingPeriod::Quarterly => "quarter",
            BillingPeriod::Yearly => "year",
        }
    }
}

/// A subscription plan selected for purchase
///
/// Only a subset of the credit-bearing fields is populated, depending on
/// the plan category; the classifier decides which of them count.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_name: String,

    #[serde(default)]
    pub plan_type: Option<String>,

    #[serde(default)]
    pub billing_period: BillingPeriod,

    /// Price in USD before conversion
    #[serde(default)]
    pub total_cost: Decimal,

    /// ISO currency code; absent means USD
    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub discount_amount: Decimal,

    // Credit-bearing fields
    #[serde(default)]
    pub credits: Option<u64>,
    #[serde(default)]
    pub sms_credits: Option<u64>,
    #[serde(default)]
    pub sms_volume: Option<u64>,
    #[serde(default)]
    pub total_credits: Option<u64>,
    #[serde(default)]
    pub contact_count: Option<u64>,
    #[serde(default)]
    pub whatsapp_volume: Option<u64>,
    #[serde(default)]
    pub verification_credits: Option<u64>,
    #[serde(default)]
    pub email_validations: Option<u64>,
    #[serde(default)]
    pub contacts: Option<u64>,
    #[serde(default)]
    pub email_sends: Option<u64>,
    #[serde(default)]
    pub emails: Option<u64>,
    #[serde(default)]
    pub slots: Option<u64>,
}

impl Plan {
    /// The currency this plan charges in; absent or empty falls back to USD
    pub fn charge_currency(&self) -> Result<Currency> {
        match self.currency.as_deref() {
            None => Ok(Currency::Usd),
            Some(code) if code.trim().is_empty() => Ok(Currency::Usd),
            Some(code) => code.parse(),
        }
    }

    /// Contact count reported with the charge request: slots first, then
    /// contact count, zero when neither is set
    pub fn charge_contacts(&self) -> u64 {
        self.slots
            .filter(|&v| v != 0)
            .or(self.contact_count.filter(|&v| v != 0))
            .unwrap_or(0)
    }
}
