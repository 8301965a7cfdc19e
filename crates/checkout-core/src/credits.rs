//! Credit Classification
//!
//! Maps a plan to exactly one credit bundle (SMS, WhatsApp, or email).
//! The fallback priority for each bundle is data, not code: every category
//! owns an ordered list of plan fields, and the first one carrying a
//! non-zero value wins.

use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// The usage credits granted by a purchase
///
/// Exactly one bundle category (SMS, WhatsApp, or the email pair) is
/// populated per classification; the other counters stay zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAllocation {
    pub email_verification_credits: u64,
    pub email_send_credits: u64,
    pub sms_credits: u64,
    pub whatsapp_credits: u64,
}

/// A credit-bearing plan field a bundle can draw from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditSource {
    Credits,
    SmsCredits,
    SmsVolume,
    TotalCredits,
    ContactCount,
    WhatsappVolume,
    VerificationCredits,
    EmailValidations,
    Contacts,
    EmailSends,
    Emails,
}

impl CreditSource {
    fn read(&self, plan: &Plan) -> Option<u64> {
        match self {
            CreditSource::Credits => plan.credits,
            CreditSource::SmsCredits => plan.sms_credits,
            CreditSource::SmsVolume => plan.sms_volume,
            CreditSource::TotalCredits => plan.total_credits,
            CreditSource::ContactCount => plan.contact_count,
            CreditSource::WhatsappVolume => plan.whatsapp_volume,
            CreditSource::VerificationCredits => plan.verification_credits,
            CreditSource::EmailValidations => plan.email_validations,
            CreditSource::Contacts => plan.contacts,
            CreditSource::EmailSends => plan.email_sends,
            CreditSource::Emails => plan.emails,
        }
    }
}

/// Fallback order for the SMS bundle
pub const SMS_SOURCES: &[CreditSource] = &[
    CreditSource::Credits,
    CreditSource::SmsCredits,
    CreditSource::SmsVolume,
    CreditSource::TotalCredits,
    CreditSource::ContactCount,
];

/// Fallback order for the WhatsApp bundle
pub const WHATSAPP_SOURCES: &[CreditSource] =
    &[CreditSource::Credits, CreditSource::WhatsappVolume];

/// Fallback order for email verification credits
pub const EMAIL_VERIFICATION_SOURCES: &[CreditSource] = &[
    CreditSource::VerificationCredits,
    CreditSource::EmailValidations,
    CreditSource::Contacts,
];

/// Fallback order for email send credits
pub const EMAIL_SEND_SOURCES: &[CreditSource] =
    &[CreditSource::EmailSends, CreditSource::Emails];

/// First source carrying a non-zero value, zero when none does
fn first_available(plan: &Plan, sources: &[CreditSource]) -> u64 {
    sources
        .iter()
        .find_map(|source| source.read(plan).filter(|&v| v != 0))
        .unwrap_or(0)
}

/// Plan category, decided by type/name markers in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanCategory {
    Sms,
    Whatsapp,
    Email,
}

/// Literal plan-type tag marking WhatsApp campaign plans
const WHATSAPP_PLAN_TYPE: &str = "multimedia-whatsapp";

impl PlanCategory {
    /// Classify a plan; first matching category wins
    pub fn of(plan: &Plan) -> Self {
        let type_lower = plan
            .plan_type
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        let name_lower = plan.plan_name.to_lowercase();

        if type_lower.contains("sms") || name_lower.contains("sms") {
            PlanCategory::Sms
        } else if plan.plan_type.as_deref() == Some(WHATSAPP_PLAN_TYPE)
            || name_lower.contains("whatsapp")
        {
            PlanCategory::Whatsapp
        } else {
            PlanCategory::Email
        }
    }
}

/// Compute the credit allocation for a plan
pub fn classify(plan: &Plan) -> CreditAllocation {
    let mut allocation = CreditAllocation::default();

    match PlanCategory::of(plan) {
        PlanCategory::Sms => {
            allocation.sms_credits = first_available(plan, SMS_SOURCES);
        }
        PlanCategory::Whatsapp => {
            allocation.whatsapp_credits = first_available(plan, WHATSAPP_SOURCES);
        }
        PlanCategory::Email => {
            allocation.email_verification_credits =
                first_available(plan, EMAIL_VERIFICATION_SOURCES);
            allocation.email_send_credits = first_available(plan, EMAIL_SEND_SOURCES);
        }
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_from(json: &str) -> Plan {
        serde_json::from_str(json).unwrap()
    }

    fn populated_bundles(allocation: &CreditAllocation) -> usize {
        let email =
            allocation.email_verification_credits != 0 || allocation.email_send_credits != 0;
        [email, allocation.sms_credits != 0, allocation.whatsapp_credits != 0]
            .iter()
            .filter(|&&b| b)
            .count()
    }

    #[test]
    fn test_sms_plan_from_contact_count() {
        let plan = plan_from(r#"{"planName": "Bulk", "planType": "sms-blast", "contactCount": 500}"#);
        let allocation = classify(&plan);

        assert_eq!(allocation.sms_credits, 500);
        assert_eq!(allocation.whatsapp_credits, 0);
        assert_eq!(allocation.email_send_credits, 0);
        assert_eq!(allocation.email_verification_credits, 0);
    }

    #[test]
    fn test_sms_priority_order() {
        // credits outranks every other SMS source
        let plan = plan_from(
            r#"{"planName": "SMS Pro", "credits": 100, "smsVolume": 900, "contactCount": 500}"#,
        );
        assert_eq!(classify(&plan).sms_credits, 100);

        // zero values are skipped, not taken
        let plan = plan_from(r#"{"planName": "SMS Pro", "credits": 0, "smsVolume": 900}"#);
        assert_eq!(classify(&plan).sms_credits, 900);
    }

    #[test]
    fn test_sms_marker_in_name_is_case_insensitive() {
        let plan = plan_from(r#"{"planName": "Mega SMS Bundle", "totalCredits": 250}"#);
        assert_eq!(classify(&plan).sms_credits, 250);
    }

    #[test]
    fn test_whatsapp_plan_by_type_tag() {
        let plan = plan_from(
            r#"{"planName": "Reach", "planType": "multimedia-whatsapp", "whatsappVolume": 750}"#,
        );
        let allocation = classify(&plan);
        assert_eq!(allocation.whatsapp_credits, 750);
        assert_eq!(populated_bundles(&allocation), 1);
    }

    #[test]
    fn test_whatsapp_plan_by_name() {
        let plan = plan_from(r#"{"planName": "WhatsApp Starter", "credits": 300}"#);
        assert_eq!(classify(&plan).whatsapp_credits, 300);
    }

    #[test]
    fn test_sms_marker_beats_whatsapp_marker() {
        // both markers present: the SMS branch is checked first
        let plan = plan_from(
            r#"{"planName": "SMS + WhatsApp Combo", "credits": 400, "whatsappVolume": 900}"#,
        );
        let allocation = classify(&plan);
        assert_eq!(allocation.sms_credits, 400);
        assert_eq!(allocation.whatsapp_credits, 0);
    }

    #[test]
    fn test_email_plan_populates_both_counters() {
        let plan = plan_from(
            r#"{"planName": "Growth", "emailSends": 1000, "emailValidations": 500}"#,
        );
        let allocation = classify(&plan);
        assert_eq!(allocation.email_send_credits, 1000);
        assert_eq!(allocation.email_verification_credits, 500);
        assert_eq!(allocation.sms_credits, 0);
        assert_eq!(allocation.whatsapp_credits, 0);
    }

    #[test]
    fn test_email_verification_priority() {
        let plan = plan_from(
            r#"{"planName": "Growth", "verificationCredits": 50, "emailValidations": 500, "contacts": 900}"#,
        );
        assert_eq!(classify(&plan).email_verification_credits, 50);
    }

    #[test]
    fn test_plan_without_credit_fields_allocates_nothing() {
        let plan = plan_from(r#"{"planName": "Trial"}"#);
        assert_eq!(classify(&plan), CreditAllocation::default());
    }

    #[test]
    fn test_exactly_one_bundle_across_representative_shapes() {
        let shapes = [
            r#"{"planName": "Bulk", "planType": "sms-blast", "contactCount": 500}"#,
            r#"{"planName": "SMS Lite", "smsCredits": 100}"#,
            r#"{"planName": "Reach", "planType": "multimedia-whatsapp", "credits": 750}"#,
            r#"{"planName": "WhatsApp Pro", "whatsappVolume": 300}"#,
            r#"{"planName": "Growth", "emailSends": 1000, "emailValidations": 500}"#,
            r#"{"planName": "Verify Only", "contacts": 2000}"#,
        ];

        for json in shapes {
            let allocation = classify(&plan_from(json));
            assert_eq!(populated_bundles(&allocation), 1, "shape: {json}");
        }
    }
}
