//! checkout-cli
//!
//! Drives one checkout attempt end to end: loads a plan from a JSON file,
//! creates the payment intent, confirms the card, persists the payment,
//! and reports the resulting entitlement counters.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{money, CardDetails, Plan, PostalAddress};
use checkout_flow::{
    cache::keys, CheckoutCache, CheckoutFlow, FlowConfig, LoggingPropagator, MemoryCheckoutCache,
    Navigator, PendingCheckout,
};
use checkout_gateway::{HttpBillingApi, StripeGateway};

/// No router to drive here; redirects are reported in the log
struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        tracing::info!(%route, "navigation requested");
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let plan_path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: checkout-cli <plan.json>"))?;
    let plan: Plan = serde_json::from_str(&std::fs::read_to_string(&plan_path)?)?;

    tracing::info!(
        plan = %plan.plan_name,
        period = plan.billing_period.as_str(),
        "loaded plan"
    );

    // Wire the HTTP collaborators
    let backend = Arc::new(HttpBillingApi::from_env()?);
    let gateway = Arc::new(StripeGateway::from_env()?);

    // Seed the session cache from the environment
    let cache = Arc::new(MemoryCheckoutCache::new());
    cache.insert(keys::USER_EMAIL, env_or("CHECKOUT_USER_EMAIL", ""));
    cache.insert(keys::USER_NAME, env_or("CHECKOUT_USER_NAME", ""));
    cache.insert(keys::USER_ID, env_or("CHECKOUT_USER_ID", ""));
    cache.insert(keys::AUTH_TOKEN, env_or("CHECKOUT_AUTH_TOKEN", ""));

    let card = CardDetails {
        number: env_or("CHECKOUT_CARD_NUMBER", "4242424242424242"),
        exp_month: env_or("CHECKOUT_CARD_EXP_MONTH", "12").parse()?,
        exp_year: env_or("CHECKOUT_CARD_EXP_YEAR", "2030").parse()?,
        cvc: env_or("CHECKOUT_CARD_CVC", "123"),
    };
    let address = PostalAddress {
        line1: env_or("CHECKOUT_ADDRESS_LINE1", "1 Main St"),
        city: env_or("CHECKOUT_ADDRESS_CITY", "Springfield"),
        postal_code: env_or("CHECKOUT_ADDRESS_POSTAL", "12345"),
    };

    let mut flow = CheckoutFlow::new(
        gateway,
        backend,
        cache.clone(),
        Arc::new(LoggingPropagator),
        Arc::new(LogNavigator),
        FlowConfig::default(),
    );

    flow.mount(Some(PendingCheckout::new(plan)))?;

    if let Some(resolved) = flow.resolved() {
        let charge_line = money::format(
            money::convert(resolved.plan.total_cost, resolved.currency),
            resolved.currency,
        );
        tracing::info!(currency = %resolved.currency, "charging {charge_line}");
    }

    match flow.submit(&card, &address).await {
        Ok(()) => {
            tracing::info!("✓ checkout complete: {}", flow.status_message());
            let counters = cache.entitlements();
            tracing::info!(
                emails = counters.email_send_credits,
                verifications = counters.email_verification_credits,
                sms = counters.sms_credits,
                whatsapp = counters.whatsapp_credits,
                "entitlement counters"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!("⚠ checkout failed: {}", err.user_message());
            std::process::exit(1);
        }
    }
}
