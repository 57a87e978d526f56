//! Routers for the support workflow's three branch points.

use parley_core::GraphState;

use crate::state::SupportState;

pub const BLOCKED: &str = "blocked";
pub const PASS: &str = "pass";
pub const GUARDRAIL_LABELS: [&str; 2] = [BLOCKED, PASS];

pub const ACCOUNT: &str = "account";
pub const GENERAL: &str = "general";
pub const PRODUCT: &str = "product";
pub const HUMAN: &str = "human";
pub const INTENT_LABELS: [&str; 4] = [ACCOUNT, GENERAL, PRODUCT, HUMAN];

pub const APPROVED: &str = "approved";
pub const REVIEW: &str = "review";
pub const COMPLIANCE_LABELS: [&str; 2] = [APPROVED, REVIEW];

/// A refused message already carries its final output.
pub fn after_guardrail(state: &GraphState<SupportState>) -> String {
    if state.data.final_output.is_some() {
        BLOCKED.to_string()
    } else {
        PASS.to_string()
    }
}

/// Maps an intent to its desk. Unknown or missing intents go to `general`.
pub fn intent_label(intent: Option<&str>) -> &'static str {
    match intent {
        Some("account_data" | "account_inquiry") => ACCOUNT,
        Some("product_acquisition" | "loan_inquiry" | "credit_card") => PRODUCT,
        Some("complaint") => HUMAN,
        _ => GENERAL,
    }
}

pub fn by_intent(state: &GraphState<SupportState>) -> String {
    intent_label(state.data.intent.as_deref()).to_string()
}

pub fn after_compliance(state: &GraphState<SupportState>) -> String {
    if state.data.is_approved {
        APPROVED.to_string()
    } else {
        REVIEW.to_string()
    }
}
