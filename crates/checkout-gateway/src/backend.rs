//! Billing Backend Client
//!
//! `reqwest` implementation of [`BillingApi`] against the fixed endpoint
//! contracts: intent creation, payment persistence, and the best-effort
//! profile update.

use async_trait::async_trait;
use checkout_core::{
    BillingApi, ChargeRequest, CheckoutError, PaymentIntentHandle, PersistedPayment, PlanUpdate,
    Result,
};

use crate::config::BackendConfig;

/// HTTP billing backend
pub struct HttpBillingApi {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBillingApi {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn create_payment_intent(&self, charge: &ChargeRequest) -> Result<PaymentIntentHandle> {
        let url = self.url("/api/stripe/create-payment-intent");
        tracing::debug!(%url, plan = %charge.plan_name, "creating payment intent");

        let response = self
            .client
            .post(&url)
            .json(charge)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Network(format!(
                "intent creation returned {status}: {body}"
            )));
        }

        response
            .json::<PaymentIntentHandle>()
            .await
            .map_err(|e| CheckoutError::Serialization(e.to_string()))
    }

    async fn save_payment(&self, payment: &PersistedPayment) -> Result<()> {
        let url = self.url("/api/stripe/save-payment");
        tracing::debug!(%url, transaction = %payment.transaction_id, "saving payment");

        let response = self
            .client
            .post(&url)
            .header("Idempotency-Key", payment.idempotency_key())
            .json(payment)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Network(format!(
                "save-payment returned {status}: {body}"
            )));
        }

        Ok(())
    }

    async fn update_user_plan(&self, token: &str, update: &PlanUpdate) -> Result<()> {
        let url = self.url("/api/users/plan");
        tracing::debug!(%url, plan = %update.plan_name, "updating user plan");

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(update)
            .send()
            .await
            .map_err(|e| CheckoutError::ProfileSync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CheckoutError::ProfileSync(format!(
                "plan update returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
