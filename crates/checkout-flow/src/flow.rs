//! Payment Orchestration
//!
//! The checkout state machine. One sequential attempt per submission:
//! build the charge, create the intent, confirm with the processor,
//! persist the payment, propagate entitlements, sync the profile, clean
//! up, redirect. Each step has its own failure semantics — intent
//! creation and confirmation are safe to retry, persistence after a
//! captured charge is not and gets its own recoverable state, and the
//! profile sync is best-effort by design.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use checkout_core::{
    backend, classify, money, BillingApi, BillingDetails, CardDetails, ChargeRequest,
    CheckoutError, CreditAllocation, PaymentGateway, PersistedPayment, PlanUpdate, PostalAddress,
    Result,
};

use crate::cache::CheckoutCache;
use crate::entitlements::{EntitlementPropagator, PurchaseSummary};
use crate::navigator::{Navigator, DASHBOARD_ROUTE, PLAN_SELECTION_ROUTE};
use crate::resolver::{self, PendingCheckout, ResolvedCheckout};

/// Where a checkout attempt currently stands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    IntentCreated,
    Confirming,
    Succeeded,
    Persisting,
    EntitlementsUpdated,
    ProfileUpdated,
    Cleaned,
    Redirected,
    /// Processor wants more from the payer (3-D Secure and friends)
    ActionRequired { status: String },
    /// Charge captured, payment record not persisted; retryable via
    /// [`CheckoutFlow::resume_persistence`]
    CapturedUnrecorded { transaction_id: String },
    Failed { message: String },
}

impl CheckoutState {
    /// Whether an attempt is mid-run; gates the submit control
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CheckoutState::Submitting
                | CheckoutState::IntentCreated
                | CheckoutState::Confirming
                | CheckoutState::Succeeded
                | CheckoutState::Persisting
                | CheckoutState::EntitlementsUpdated
                | CheckoutState::ProfileUpdated
                | CheckoutState::Cleaned
        )
    }
}

/// Orchestrator tuning
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Pause between the success message and the dashboard redirect
    pub redirect_delay: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            redirect_delay: Duration::from_secs(3),
        }
    }
}

/// The checkout flow for one user session
pub struct CheckoutFlow {
    gateway: Arc<dyn PaymentGateway>,
    backend: Arc<dyn BillingApi>,
    cache: Arc<dyn CheckoutCache>,
    propagator: Arc<dyn EntitlementPropagator>,
    navigator: Arc<dyn Navigator>,
    config: FlowConfig,

    resolved: Option<ResolvedCheckout>,
    state: CheckoutState,
    status: String,
    /// Built record retained while persistence is outstanding
    pending_record: Option<PersistedPayment>,
}

impl CheckoutFlow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        backend: Arc<dyn BillingApi>,
        cache: Arc<dyn CheckoutCache>,
        propagator: Arc<dyn EntitlementPropagator>,
        navigator: Arc<dyn Navigator>,
        config: FlowConfig,
    ) -> Self {
        Self {
            gateway,
            backend,
            cache,
            propagator,
            navigator,
            config,
            resolved: None,
            state: CheckoutState::Idle,
            status: String::new(),
            pending_record: None,
        }
    }

    /// Resolve the plan selection for this session
    ///
    /// Unresolved sessions are redirected to plan selection and left
    /// without a plan; a later submit fails the precondition check.
    pub fn mount(&mut self, navigation: Option<PendingCheckout>) -> Result<()> {
        match resolver::resolve(navigation, self.cache.as_ref())? {
            Some(resolved) => {
                tracing::info!(
                    plan = %resolved.plan.plan_name,
                    currency = %resolved.currency,
                    "checkout resolved"
                );
                self.resolved = Some(resolved);
            }
            None => {
                tracing::warn!("no plan to check out, redirecting to plan selection");
                self.navigator.redirect(PLAN_SELECTION_ROUTE);
            }
        }
        Ok(())
    }

    pub fn resolved(&self) -> Option<&ResolvedCheckout> {
        self.resolved.as_ref()
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Human-readable progress for the submit control
    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Run one checkout attempt
    ///
    /// A submit while an attempt is in flight is a no-op: the control is
    /// disabled, nothing is sent anywhere.
    pub async fn submit(&mut self, card: &CardDetails, address: &PostalAddress) -> Result<()> {
        if self.is_busy() {
            tracing::debug!("submission ignored while an attempt is in flight");
            return Ok(());
        }

        let Some(checkout) = self.resolved.clone() else {
            self.status = "No plan selected".into();
            return Err(CheckoutError::NoPlanSelected);
        };

        self.state = CheckoutState::Submitting;
        self.status = "Processing payment...".into();
        self.pending_record = None;

        let attempt = Uuid::new_v4();
        tracing::info!(
            attempt = %attempt,
            plan = %checkout.plan.plan_name,
            currency = %checkout.currency,
            "starting checkout attempt"
        );

        match self.run_attempt(&checkout, card, address).await {
            Ok(()) => {
                tracing::info!(attempt = %attempt, "checkout attempt completed");
                Ok(())
            }
            Err(err) => {
                match &err {
                    CheckoutError::ActionRequired(status) => {
                        self.state = CheckoutState::ActionRequired {
                            status: status.clone(),
                        };
                    }
                    CheckoutError::CapturedUnrecorded { transaction_id, .. } => {
                        self.state = CheckoutState::CapturedUnrecorded {
                            transaction_id: transaction_id.clone(),
                        };
                    }
                    _ => {
                        self.state = CheckoutState::Failed {
                            message: err.to_string(),
                        };
                    }
                }
                self.status = err.user_message().to_string();
                tracing::error!(attempt = %attempt, error = %err, "checkout attempt failed");
                Err(err)
            }
        }
    }

    async fn run_attempt(
        &mut self,
        checkout: &ResolvedCheckout,
        card: &CardDetails,
        address: &PostalAddress,
    ) -> Result<()> {
        // Step 1: charge intent. Nothing external has happened yet, so
        // any failure here is safe to retry.
        let amount = money::convert(checkout.plan.total_cost, checkout.currency);
        let charge = ChargeRequest {
            amount,
            email: checkout.email.clone(),
            user_id: checkout.user_id.clone(),
            plan_name: checkout.plan.plan_name.clone(),
            plan_type: checkout.plan.billing_period.as_str().into(),
            provider: backend::PROVIDER.into(),
            contacts: checkout.plan.charge_contacts(),
            currency: checkout.currency.wire_code(),
        };

        let intent = self
            .backend
            .create_payment_intent(&charge)
            .await
            .map_err(|err| CheckoutError::IntentCreation(err.to_string()))?;
        self.state = CheckoutState::IntentCreated;
        tracing::debug!(transaction = %intent.transaction_id, "payment intent created");

        // Step 2: confirm with the processor.
        self.state = CheckoutState::Confirming;
        let billing = BillingDetails {
            name: checkout.name.clone(),
            email: checkout.email.clone(),
            address: address.clone(),
            country: checkout.currency.country_code().into(),
        };
        let confirmation = self
            .gateway
            .confirm_card_payment(&intent.client_secret, card, &billing)
            .await?;

        if !confirmation.succeeded() {
            return Err(CheckoutError::ActionRequired(confirmation.status));
        }

        self.state = CheckoutState::Succeeded;
        self.status = "Payment successful! Saving payment...".into();

        // Step 3: classify credits and persist the payment. The charge is
        // already captured; a failure here must not look like a declined
        // card.
        let allocation = classify(&checkout.plan);
        tracing::info!(
            sms = allocation.sms_credits,
            whatsapp = allocation.whatsapp_credits,
            email_sends = allocation.email_send_credits,
            email_verifications = allocation.email_verification_credits,
            "credit allocation computed"
        );

        let record = PersistedPayment {
            user_id: checkout.user_id.clone(),
            name: checkout.name.clone(),
            email: checkout.email.clone(),
            transaction_id: intent.transaction_id.clone(),
            plan_name: checkout.plan.plan_name.clone(),
            plan_type: checkout.plan.billing_period.as_str().into(),
            provider: backend::PROVIDER.into(),
            email_verification_credits: allocation.email_verification_credits,
            email_send_credits: allocation.email_send_credits,
            sms_credits: allocation.sms_credits,
            whatsapp_credits: allocation.whatsapp_credits,
            amount,
            currency: checkout.currency.wire_code(),
            plan_price: amount - checkout.plan.discount_amount,
            discount: checkout.plan.discount_amount,
            payment_method: confirmation.payment_method(),
            card_last4: confirmation.card_last4(),
            billing_address: address.joined(),
            payment_date: Utc::now(),
            status: confirmation.status.clone(),
        };

        self.state = CheckoutState::Persisting;
        self.pending_record = Some(record.clone());
        self.backend
            .save_payment(&record)
            .await
            .map_err(|err| CheckoutError::CapturedUnrecorded {
                transaction_id: record.transaction_id.clone(),
                message: err.to_string(),
            })?;

        self.complete_after_persistence(&record).await;
        Ok(())
    }

    /// Retry persistence after a `CapturedUnrecorded` outcome
    ///
    /// Reuses the record (and idempotency key) built for the captured
    /// charge; the processor is not touched again.
    pub async fn resume_persistence(&mut self) -> Result<()> {
        if !matches!(self.state, CheckoutState::CapturedUnrecorded { .. }) {
            return Err(CheckoutError::Storage(
                "no captured payment awaiting persistence".into(),
            ));
        }
        let Some(record) = self.pending_record.clone() else {
            return Err(CheckoutError::Storage(
                "captured payment record is gone".into(),
            ));
        };

        self.state = CheckoutState::Persisting;
        self.status = "Payment successful! Saving payment...".into();
        tracing::info!(transaction = %record.transaction_id, "retrying payment persistence");

        match self.backend.save_payment(&record).await {
            Ok(()) => {
                self.complete_after_persistence(&record).await;
                Ok(())
            }
            Err(err) => {
                let err = CheckoutError::CapturedUnrecorded {
                    transaction_id: record.transaction_id.clone(),
                    message: err.to_string(),
                };
                self.state = CheckoutState::CapturedUnrecorded {
                    transaction_id: record.transaction_id.clone(),
                };
                self.status = err.user_message().to_string();
                tracing::error!(error = %err, "payment persistence retry failed");
                Err(err)
            }
        }
    }

    /// Everything after a persisted payment: local counters, propagation,
    /// best-effort profile sync, cleanup, redirect.
    async fn complete_after_persistence(&mut self, record: &PersistedPayment) {
        let allocation = CreditAllocation {
            email_verification_credits: record.email_verification_credits,
            email_send_credits: record.email_send_credits,
            sms_credits: record.sms_credits,
            whatsapp_credits: record.whatsapp_credits,
        };

        // Overwrite, never sum: repeated purchases must not double-count.
        self.cache.write_entitlements(&allocation);
        self.state = CheckoutState::EntitlementsUpdated;

        self.propagator
            .purchase_completed(&PurchaseSummary::new(record.plan_name.clone(), &allocation));

        // Best effort: a failed profile sync never rolls back the purchase.
        let token = self.cache.auth_token().unwrap_or_default();
        let update = PlanUpdate {
            plan_name: record.plan_name.clone(),
            contact_limit: allocation.email_verification_credits,
            email_limit: allocation.email_send_credits,
        };
        if let Err(err) = self.backend.update_user_plan(&token, &update).await {
            tracing::warn!(error = %err, "failed to update user plan");
        }
        self.state = CheckoutState::ProfileUpdated;

        self.cache.clear_pending_plan();
        self.state = CheckoutState::Cleaned;
        self.status = "Payment successful! Redirecting to dashboard...".into();

        tokio::time::sleep(self.config.redirect_delay).await;
        self.navigator.redirect(DASHBOARD_ROUTE);
        self.state = CheckoutState::Redirected;
        self.pending_record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::cache::{keys, MemoryCheckoutCache};
    use crate::mock::{
        GatewayBehavior, MockBillingApi, MockPaymentGateway, RecordingNavigator,
        RecordingPropagator,
    };
    use checkout_core::Plan;

    struct Harness {
        flow: CheckoutFlow,
        gateway: Arc<MockPaymentGateway>,
        backend: Arc<MockBillingApi>,
        cache: Arc<MemoryCheckoutCache>,
        navigator: Arc<RecordingNavigator>,
        propagator: Arc<RecordingPropagator>,
    }

    fn harness(behavior: GatewayBehavior) -> Harness {
        let gateway = Arc::new(MockPaymentGateway::new(behavior));
        let backend = Arc::new(MockBillingApi::new());
        let cache = Arc::new(MemoryCheckoutCache::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let propagator = Arc::new(RecordingPropagator::new());

        cache.insert(keys::USER_EMAIL, "jo@example.com");
        cache.insert(keys::USER_NAME, "Jo");
        cache.insert(keys::USER_ID, "u-1");
        cache.insert(keys::AUTH_TOKEN, "tok-1");

        let flow = CheckoutFlow::new(
            gateway.clone(),
            backend.clone(),
            cache.clone(),
            propagator.clone(),
            navigator.clone(),
            FlowConfig {
                redirect_delay: Duration::ZERO,
            },
        );

        Harness {
            flow,
            gateway,
            backend,
            cache,
            navigator,
            propagator,
        }
    }

    fn email_plan() -> Plan {
        serde_json::from_str(
            r#"{
                "planName": "Growth",
                "billingPeriod": "monthly",
                "totalCost": 29.99,
                "currency": "EUR",
                "discountAmount": 5,
                "emailSends": 1000,
                "emailValidations": 500
            }"#,
        )
        .unwrap()
    }

    fn card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".into(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".into(),
        }
    }

    fn address() -> PostalAddress {
        PostalAddress {
            line1: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
        }
    }

    #[tokio::test]
    async fn test_email_plan_success_overwrites_entitlements() {
        let mut h = harness(GatewayBehavior::Succeed);
        // Stale counters from an earlier purchase must be replaced, not
        // summed.
        h.cache.insert(keys::EMAIL_SENDS, "250");
        h.cache.insert(keys::SMS_CREDITS, "40");

        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();
        h.flow.submit(&card(), &address()).await.unwrap();

        assert_eq!(*h.flow.state(), CheckoutState::Redirected);
        assert!(!h.flow.is_busy());

        let counters = h.cache.entitlements();
        assert_eq!(counters.email_send_credits, 1000);
        assert_eq!(counters.email_verification_credits, 500);
        assert_eq!(counters.sms_credits, 0);
        assert_eq!(counters.whatsapp_credits, 0);

        assert!(h.cache.load_pending_plan().unwrap().is_none());
        assert_eq!(
            h.navigator.routes.lock().unwrap().as_slice(),
            [DASHBOARD_ROUTE.to_string()]
        );

        let summaries = h.propagator.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].emails, 1000);
        assert_eq!(summaries[0].verifications, 500);
    }

    #[tokio::test]
    async fn test_charge_request_uses_converted_amount() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();
        h.flow.submit(&card(), &address()).await.unwrap();

        let charges = h.backend.charges.lock().unwrap();
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].amount, dec!(27.89));
        assert_eq!(charges[0].currency, "eur");
        assert_eq!(charges[0].plan_type, "monthly");
        assert_eq!(charges[0].provider, "Stripe");

        let saved = h.backend.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].plan_price, dec!(22.89));
        assert_eq!(saved[0].discount, dec!(5));
        assert_eq!(saved[0].card_last4, "4242");
        assert_eq!(saved[0].payment_method, "card");
        assert_eq!(saved[0].billing_address, "1 Main St, Springfield, 12345");
        assert_eq!(saved[0].status, "succeeded");

        let updates = h.backend.plan_updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "tok-1");
        assert_eq!(updates[0].1.contact_limit, 500);
        assert_eq!(updates[0].1.email_limit, 1000);
    }

    #[tokio::test]
    async fn test_sms_plan_populates_only_sms_counter() {
        let mut h = harness(GatewayBehavior::Succeed);
        let plan: Plan = serde_json::from_str(
            r#"{"planName": "Bulk", "planType": "sms-blast", "totalCost": 15, "contactCount": 500}"#,
        )
        .unwrap();

        h.flow.mount(Some(PendingCheckout::new(plan))).unwrap();
        h.flow.submit(&card(), &address()).await.unwrap();

        let counters = h.cache.entitlements();
        assert_eq!(counters.sms_credits, 500);
        assert_eq!(counters.whatsapp_credits, 0);
        assert_eq!(counters.email_send_credits, 0);
        assert_eq!(counters.email_verification_credits, 0);
    }

    #[tokio::test]
    async fn test_declined_card_fails_without_persistence() {
        let mut h = harness(GatewayBehavior::Decline("Your card was declined.".into()));
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        let err = h.flow.submit(&card(), &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentDeclined(_)));
        assert!(err.is_retryable());

        assert!(matches!(h.flow.state(), CheckoutState::Failed { .. }));
        assert!(!h.flow.is_busy());
        assert_eq!(h.flow.status_message(), "Your card was declined.");
        assert!(h.backend.saved.lock().unwrap().is_empty());
        assert!(h.backend.save_attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_succeeded_status_requires_action() {
        let mut h = harness(GatewayBehavior::Status("requires_action".into()));
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        let err = h.flow.submit(&card(), &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ActionRequired(_)));
        assert_eq!(
            *h.flow.state(),
            CheckoutState::ActionRequired {
                status: "requires_action".into()
            }
        );
        assert!(h.backend.save_attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intent_failure_is_retryable_and_touches_nothing() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.backend.fail_intent("backend unreachable");
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        let err = h.flow.submit(&card(), &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::IntentCreation(_)));
        assert!(err.is_retryable());
        assert_eq!(h.gateway.call_count(), 0);
        assert!(matches!(h.flow.state(), CheckoutState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_profile_sync_failure_does_not_block_completion() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.backend.fail_profile("profile service down");
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        h.flow.submit(&card(), &address()).await.unwrap();

        assert_eq!(*h.flow.state(), CheckoutState::Redirected);
        assert!(h.backend.plan_updates.lock().unwrap().is_empty());
        assert_eq!(h.backend.saved.lock().unwrap().len(), 1);
        assert_eq!(h.cache.entitlements().email_send_credits, 1000);
    }

    #[tokio::test]
    async fn test_submit_without_plan_is_a_precondition_failure() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.flow.mount(None).unwrap();

        assert_eq!(
            h.navigator.routes.lock().unwrap().as_slice(),
            [PLAN_SELECTION_ROUTE.to_string()]
        );

        let err = h.flow.submit(&card(), &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NoPlanSelected));
        assert_eq!(*h.flow.state(), CheckoutState::Idle);
        assert_eq!(h.flow.status_message(), "No plan selected");
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_a_no_op() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        h.flow.state = CheckoutState::Confirming;
        h.flow.submit(&card(), &address()).await.unwrap();

        assert_eq!(*h.flow.state(), CheckoutState::Confirming);
        assert_eq!(h.gateway.call_count(), 0);
        assert!(h.backend.charges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_captured_unrecorded_can_resume_persistence() {
        let mut h = harness(GatewayBehavior::Succeed);
        h.backend.fail_save("database down");
        h.flow
            .mount(Some(PendingCheckout::new(email_plan())))
            .unwrap();

        let err = h.flow.submit(&card(), &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::CapturedUnrecorded { .. }));
        assert_eq!(
            *h.flow.state(),
            CheckoutState::CapturedUnrecorded {
                transaction_id: "pi_test_1".into()
            }
        );
        // Charge went through but nothing downstream happened yet.
        assert_eq!(h.gateway.call_count(), 1);
        assert_eq!(h.cache.entitlements().email_send_credits, 0);

        h.backend.clear_save_failure();
        h.flow.resume_persistence().await.unwrap();

        assert_eq!(*h.flow.state(), CheckoutState::Redirected);
        assert_eq!(h.cache.entitlements().email_send_credits, 1000);
        // Same idempotency key on both attempts, and no second charge.
        let attempts = h.backend.save_attempts.lock().unwrap();
        assert_eq!(attempts.as_slice(), ["save-payment-pi_test_1"; 2]);
        assert_eq!(h.gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_persistence_requires_a_captured_payment() {
        let mut h = harness(GatewayBehavior::Succeed);
        let err = h.flow.resume_persistence().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Storage(_)));
    }
}
