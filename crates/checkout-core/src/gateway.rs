//! Payment Gateway Seam
//!
//! The card-confirming payment capability, reduced to the interface the
//! orchestrator needs: hand over a client secret, card input, and billing
//! details; get back a confirmation or a decline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw card input collected from the payer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
}

/// Postal address collected alongside the card
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostalAddress {
    pub line1: String,
    pub city: String,
    pub postal_code: String,
}

impl PostalAddress {
    /// Single-line form persisted with the payment record
    pub fn joined(&self) -> String {
        format!("{}, {}, {}", self.line1, self.city, self.postal_code)
    }
}

/// Billing details attached to a confirmation attempt
#[derive(Clone, Debug, Serialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
    pub address: PostalAddress,
    /// ISO 3166 alpha-2, derived from the charge currency
    pub country: String,
}

/// Card summary inside a charge record; display-only
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardSummary {
    #[serde(default)]
    pub last4: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentMethodDetails {
    #[serde(default)]
    pub card: Option<CardSummary>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChargeRecord {
    #[serde(default)]
    pub payment_method_details: Option<PaymentMethodDetails>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChargeList {
    #[serde(default)]
    pub data: Vec<ChargeRecord>,
}

/// Processor result of a confirmation attempt
///
/// Opaque beyond the status check, the payment-method tag, and the card
/// suffix extracted for display.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentConfirmation {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    #[serde(default)]
    pub charges: ChargeList,
}

impl PaymentConfirmation {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// First reported payment-method tag, empty when absent
    pub fn payment_method(&self) -> String {
        self.payment_method_types.first().cloned().unwrap_or_default()
    }

    /// Card suffix of the first charge, empty when absent
    pub fn card_last4(&self) -> String {
        self.charges
            .data
            .first()
            .and_then(|charge| charge.payment_method_details.as_ref())
            .and_then(|details| details.card.as_ref())
            .map(|card| card.last4.clone())
            .unwrap_or_default()
    }
}

/// Card-confirming payment capability
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirm a charge against a previously created intent
    ///
    /// A processor-reported decline surfaces as `PaymentDeclined` carrying
    /// the processor's message; any other status comes back inside the
    /// confirmation for the caller to interpret.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation>;

    /// Processor name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_extracts_card_suffix() {
        let confirmation: PaymentConfirmation = serde_json::from_str(
            r#"{
                "id": "pi_123",
                "status": "succeeded",
                "payment_method_types": ["card"],
                "charges": {
                    "data": [
                        {"payment_method_details": {"card": {"last4": "4242"}}}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert!(confirmation.succeeded());
        assert_eq!(confirmation.payment_method(), "card");
        assert_eq!(confirmation.card_last4(), "4242");
    }

    #[test]
    fn test_confirmation_tolerates_missing_charges() {
        let confirmation: PaymentConfirmation =
            serde_json::from_str(r#"{"id": "pi_123", "status": "requires_action"}"#).unwrap();

        assert!(!confirmation.succeeded());
        assert_eq!(confirmation.payment_method(), "");
        assert_eq!(confirmation.card_last4(), "");
    }

    #[test]
    fn test_postal_address_joins_for_persistence() {
        let address = PostalAddress {
            line1: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
        };
        assert_eq!(address.joined(), "1 Main St, Springfield, 12345");
    }
}
