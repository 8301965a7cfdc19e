//! Stripe Card Confirmation
//!
//! Implements [`PaymentGateway`] over Stripe's REST surface. Confirmation
//! happens with the intent's client secret and the publishable key — the
//! same call the browser-side library issues — so no secret key is ever
//! present in this process.

use async_trait::async_trait;
use checkout_core::{
    BillingDetails, CardDetails, CheckoutError, PaymentConfirmation, PaymentGateway, Result,
};

use crate::config::ProcessorConfig;

/// Stripe payment gateway
pub struct StripeGateway {
    client: reqwest::Client,
    config: ProcessorConfig,
}

impl StripeGateway {
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ProcessorConfig::from_env()?)
    }
}

/// Intent id embedded in a client secret (`pi_xxx_secret_yyy` → `pi_xxx`)
fn intent_id(client_secret: &str) -> Result<&str> {
    match client_secret.split_once("_secret") {
        Some((id, _)) if !id.is_empty() => Ok(id),
        _ => Err(CheckoutError::Gateway(
            "malformed client secret".into(),
        )),
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation> {
        let id = intent_id(client_secret)?;
        let url = format!("{}/v1/payment_intents/{id}/confirm", self.config.api_base);
        tracing::debug!(intent = %id, "confirming card payment");

        let params: Vec<(&str, String)> = vec![
            ("key", self.config.publishable_key.clone()),
            ("client_secret", client_secret.to_string()),
            ("payment_method_data[type]", "card".into()),
            ("payment_method_data[card][number]", card.number.clone()),
            (
                "payment_method_data[card][exp_month]",
                card.exp_month.to_string(),
            ),
            (
                "payment_method_data[card][exp_year]",
                card.exp_year.to_string(),
            ),
            ("payment_method_data[card][cvc]", card.cvc.clone()),
            (
                "payment_method_data[billing_details][name]",
                billing.name.clone(),
            ),
            (
                "payment_method_data[billing_details][email]",
                billing.email.clone(),
            ),
            (
                "payment_method_data[billing_details][address][line1]",
                billing.address.line1.clone(),
            ),
            (
                "payment_method_data[billing_details][address][city]",
                billing.address.city.clone(),
            ),
            (
                "payment_method_data[billing_details][address][postal_code]",
                billing.address.postal_code.clone(),
            ),
            (
                "payment_method_data[billing_details][address][country]",
                billing.country.clone(),
            ),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CheckoutError::Gateway(e.to_string()))?;

        // Declines come back as an error object with a payer-facing
        // message; anything else parses as a confirmation.
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Your card could not be charged.");
            return Err(CheckoutError::PaymentDeclined(message.to_string()));
        }

        serde_json::from_value(body).map_err(|e| CheckoutError::Gateway(e.to_string()))
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_extraction() {
        assert_eq!(intent_id("pi_123_secret_abc").unwrap(), "pi_123");
        assert!(intent_id("_secret_abc").is_err());
        assert!(intent_id("no-separator").is_err());
    }
}
