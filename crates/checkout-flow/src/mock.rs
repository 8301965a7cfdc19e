//! Mock Collaborators
//!
//! Recording implementations of the external seams, used by the flow
//! tests and available to downstream callers for dry runs.

use std::sync::Mutex;

use async_trait::async_trait;
use checkout_core::{
    gateway::{CardSummary, ChargeList, ChargeRecord, PaymentMethodDetails},
    BillingApi, BillingDetails, CardDetails, ChargeRequest, CheckoutError, PaymentConfirmation,
    PaymentGateway, PaymentIntentHandle, PersistedPayment, PlanUpdate, Result,
};

use crate::entitlements::{EntitlementPropagator, PurchaseSummary};
use crate::navigator::Navigator;

/// What the mock gateway does with a confirmation attempt
#[derive(Clone, Debug)]
pub enum GatewayBehavior {
    /// Succeed with a card confirmation ending in 4242
    Succeed,
    /// Processor-reported decline with this message
    Decline(String),
    /// Finish in a non-succeeded status (e.g. "requires_action")
    Status(String),
    /// Transport-level failure
    Fail(String),
}

/// Recording payment gateway
pub struct MockPaymentGateway {
    pub behavior: Mutex<GatewayBehavior>,
    pub confirmations: Mutex<Vec<String>>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new(GatewayBehavior::Succeed)
    }
}

impl MockPaymentGateway {
    pub fn new(behavior: GatewayBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            confirmations: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.confirmations.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        _card: &CardDetails,
        _billing: &BillingDetails,
    ) -> Result<PaymentConfirmation> {
        self.confirmations
            .lock()
            .unwrap()
            .push(client_secret.to_string());

        let behavior = self.behavior.lock().unwrap().clone();
        let intent_id = client_secret
            .split("_secret")
            .next()
            .unwrap_or("pi_mock")
            .to_string();

        match behavior {
            GatewayBehavior::Succeed => Ok(PaymentConfirmation {
                id: intent_id,
                status: "succeeded".into(),
                payment_method_types: vec!["card".into()],
                charges: ChargeList {
                    data: vec![ChargeRecord {
                        payment_method_details: Some(PaymentMethodDetails {
                            card: Some(CardSummary {
                                last4: "4242".into(),
                            }),
                        }),
                    }],
                },
            }),
            GatewayBehavior::Status(status) => Ok(PaymentConfirmation {
                id: intent_id,
                status,
                payment_method_types: vec!["card".into()],
                charges: ChargeList::default(),
            }),
            GatewayBehavior::Decline(message) => Err(CheckoutError::PaymentDeclined(message)),
            GatewayBehavior::Fail(message) => Err(CheckoutError::Network(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Recording billing backend
///
/// Failures are injected per operation and can be cleared mid-test to
/// exercise retry paths.
pub struct MockBillingApi {
    pub intent_failure: Mutex<Option<String>>,
    pub save_failure: Mutex<Option<String>>,
    pub profile_failure: Mutex<Option<String>>,

    pub charges: Mutex<Vec<ChargeRequest>>,
    /// Every save attempt, keyed by idempotency key
    pub save_attempts: Mutex<Vec<String>>,
    pub saved: Mutex<Vec<PersistedPayment>>,
    pub plan_updates: Mutex<Vec<(String, PlanUpdate)>>,
}

impl Default for MockBillingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBillingApi {
    pub fn new() -> Self {
        Self {
            intent_failure: Mutex::new(None),
            save_failure: Mutex::new(None),
            profile_failure: Mutex::new(None),
            charges: Mutex::new(Vec::new()),
            save_attempts: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
            plan_updates: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_intent(&self, message: impl Into<String>) {
        *self.intent_failure.lock().unwrap() = Some(message.into());
    }

    pub fn fail_save(&self, message: impl Into<String>) {
        *self.save_failure.lock().unwrap() = Some(message.into());
    }

    pub fn clear_save_failure(&self) {
        *self.save_failure.lock().unwrap() = None;
    }

    pub fn fail_profile(&self, message: impl Into<String>) {
        *self.profile_failure.lock().unwrap() = Some(message.into());
    }
}

#[async_trait]
impl BillingApi for MockBillingApi {
    async fn create_payment_intent(&self, charge: &ChargeRequest) -> Result<PaymentIntentHandle> {
        if let Some(message) = self.intent_failure.lock().unwrap().clone() {
            return Err(CheckoutError::Network(message));
        }

        self.charges.lock().unwrap().push(charge.clone());
        Ok(PaymentIntentHandle {
            transaction_id: "pi_test_1".into(),
            client_secret: "pi_test_1_secret_abc".into(),
        })
    }

    async fn save_payment(&self, payment: &PersistedPayment) -> Result<()> {
        self.save_attempts
            .lock()
            .unwrap()
            .push(payment.idempotency_key());

        if let Some(message) = self.save_failure.lock().unwrap().clone() {
            return Err(CheckoutError::Network(message));
        }

        self.saved.lock().unwrap().push(payment.clone());
        Ok(())
    }

    async fn update_user_plan(&self, token: &str, update: &PlanUpdate) -> Result<()> {
        if let Some(message) = self.profile_failure.lock().unwrap().clone() {
            return Err(CheckoutError::ProfileSync(message));
        }

        self.plan_updates
            .lock()
            .unwrap()
            .push((token.to_string(), update.clone()));
        Ok(())
    }
}

/// Navigator that records every redirect
#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// Propagator that records every purchase summary
#[derive(Default)]
pub struct RecordingPropagator {
    pub summaries: Mutex<Vec<PurchaseSummary>>,
}

impl RecordingPropagator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntitlementPropagator for RecordingPropagator {
    fn purchase_completed(&self, summary: &PurchaseSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}
