//! Checkout Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Errors surfaced by the checkout pipeline
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// No resolved plan when a submission was attempted
    #[error("no plan selected")]
    NoPlanSelected,

    /// Plan carries a currency code outside the supported table
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Payment-intent creation failed; nothing was charged
    #[error("payment intent creation failed: {0}")]
    IntentCreation(String),

    /// Processor declined the charge
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// Processor finished in a non-succeeded status (e.g. 3-D Secure)
    #[error("additional authentication required (processor status: {0})")]
    ActionRequired(String),

    /// Charge captured but the payment record was not persisted
    #[error("payment {transaction_id} captured but not recorded: {message}")]
    CapturedUnrecorded {
        transaction_id: String,
        message: String,
    },

    /// Best-effort profile sync failed
    #[error("profile sync failed: {0}")]
    ProfileSync(String),

    /// Processor-side protocol error that is not a decline
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Local cache failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Payload (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Check if a fresh submission is safe after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::IntentCreation(_)
                | CheckoutError::PaymentDeclined(_)
                | CheckoutError::Network(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            CheckoutError::NoPlanSelected => "No plan selected",
            CheckoutError::UnsupportedCurrency(_) => "This currency is not supported.",
            CheckoutError::IntentCreation(_) => "Could not start the payment. Please try again.",
            CheckoutError::PaymentDeclined(message) => message,
            CheckoutError::ActionRequired(_) => {
                "Your bank requires additional authentication to complete this payment."
            }
            CheckoutError::CapturedUnrecorded { .. } => {
                "Your payment went through but could not be recorded. Please contact support."
            }
            CheckoutError::Config(_) => "Service configuration error.",
            _ => "Something went wrong processing your payment.",
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}
