//! Gateway Configuration

use std::time::Duration;

use checkout_core::{CheckoutError, Result};

/// Default client-side timeout; a hung request must fail the attempt
/// rather than wedge the flow behind a disabled submit control.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Billing backend connection settings
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL of the billing backend
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CHECKOUT_API_URL")
            .map_err(|_| CheckoutError::Config("CHECKOUT_API_URL not set".into()))?;

        Ok(Self {
            base_url: trim_trailing_slash(base_url),
            timeout: timeout_from_env(),
        })
    }
}

/// Payment processor connection settings
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// Publishable key presented with client-secret confirmations
    pub publishable_key: String,

    /// Processor API base; overridable for test doubles
    pub api_base: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ProcessorConfig {
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            publishable_key: publishable_key.into(),
            api_base: "https://api.stripe.com".into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let publishable_key = std::env::var("STRIPE_PUBLISHABLE_KEY")
            .map_err(|_| CheckoutError::Config("STRIPE_PUBLISHABLE_KEY not set".into()))?;
        let api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| "https://api.stripe.com".into());

        Ok(Self {
            publishable_key,
            api_base: trim_trailing_slash(api_base),
            timeout: timeout_from_env(),
        })
    }
}

fn timeout_from_env() -> Duration {
    std::env::var("CHECKOUT_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

fn trim_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
