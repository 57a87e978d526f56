//! Step handlers for the support workflow.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::{GraphState, ParleyError, StateUpdate, StepContext, StepHandler};
use serde_json::{json, Map, Value};

use crate::compliance::{append_notices, ComplianceRules};
use crate::guardrail::{Guardrail, Verdict};
use crate::handlers::{
    AccountDesk, AgentReply, EscalationDesk, GeneralDesk, Inquiry, IntentClassifier, ProductDesk,
};
use crate::state::{FinalOutput, SupportState, SupportUpdate};

pub const GUARDRAIL: &str = "guardrail";
pub const CLASSIFY: &str = "classify";
pub const ACCOUNT: &str = "account";
pub const GENERAL: &str = "general";
pub const PRODUCT: &str = "product";
pub const HUMAN: &str = "human";
pub const COMPLIANCE: &str = "compliance";
pub const HUMAN_APPROVAL: &str = "human_approval";
pub const END: &str = "end";

const NO_RESPONSE: &str =
    "I'm sorry, I couldn't find an answer to that. A member of our team will follow up.";

fn inquiry(state: &SupportState) -> Inquiry<'_> {
    Inquiry {
        thread_id: state.thread_id,
        customer_id: state.customer_id,
        message: state.handler_message(),
        history: &state.history,
    }
}

pub struct GuardrailStep {
    guardrail: Arc<Guardrail>,
}

impl GuardrailStep {
    pub fn new(guardrail: Arc<Guardrail>) -> Self {
        Self { guardrail }
    }
}

#[async_trait]
impl StepHandler<SupportState> for GuardrailStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        match self.guardrail.check(&state.data.message) {
            Verdict::Blocked { reason } => {
                tracing::warn!(thread_id = ctx.thread_id, reason = %reason, "message blocked");
                let refusal = self.guardrail.refusal_message().to_string();
                let mut metadata = Map::new();
                metadata.insert("blocked_reason".to_string(), Value::from(reason));
                Ok(StateUpdate::new(SupportUpdate {
                    active_step_name: Some(Some(GUARDRAIL.to_string())),
                    step_response: Some(Some(refusal.clone())),
                    final_output: Some(Some(FinalOutput {
                        message: refusal,
                        step_name: GUARDRAIL.to_string(),
                        handled_by: Some(GUARDRAIL.to_string()),
                        intent: None,
                        confidence: 1.0,
                        metadata,
                    })),
                    ..SupportUpdate::default()
                }))
            }
            Verdict::Allowed {
                redacted,
                redactions,
            } => {
                if !redactions.is_empty() {
                    tracing::info!(thread_id = ctx.thread_id, ?redactions, "redacted PII");
                }
                Ok(StateUpdate::new(SupportUpdate {
                    redacted_message: redacted.map(Some),
                    ..SupportUpdate::default()
                }))
            }
        }
    }
}

pub struct ClassifyStep {
    classifier: Arc<dyn IntentClassifier>,
}

impl ClassifyStep {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl StepHandler<SupportState> for ClassifyStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        let classification = self.classifier.classify(inquiry(&state.data)).await?;
        tracing::info!(
            thread_id = ctx.thread_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            "classified"
        );
        Ok(StateUpdate::new(SupportUpdate {
            intent: Some(Some(classification.intent)),
            intent_confidence: Some(classification.confidence.clamp(0.0, 1.0)),
            ..SupportUpdate::default()
        }))
    }
}

#[derive(Clone)]
pub enum Desk {
    Account(Arc<dyn AccountDesk>),
    General(Arc<dyn GeneralDesk>),
    Product(Arc<dyn ProductDesk>),
    Escalation(Arc<dyn EscalationDesk>),
}

impl Desk {
    fn step_name(&self) -> &'static str {
        match self {
            Desk::Account(_) => ACCOUNT,
            Desk::General(_) => GENERAL,
            Desk::Product(_) => PRODUCT,
            Desk::Escalation(_) => HUMAN,
        }
    }
}

/// Calls one desk and records its reply as the active response.
pub struct DeskStep {
    desk: Desk,
}

impl DeskStep {
    pub fn new(desk: Desk) -> Self {
        Self { desk }
    }
}

#[async_trait]
impl StepHandler<SupportState> for DeskStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        let inquiry = inquiry(&state.data);
        let reply: AgentReply = match &self.desk {
            Desk::Account(desk) => desk.answer(inquiry).await?,
            Desk::General(desk) => desk.answer(inquiry).await?,
            Desk::Product(desk) => desk.recommend(inquiry).await?,
            Desk::Escalation(desk) => desk.escalate(inquiry).await?,
        };
        tracing::info!(
            thread_id = ctx.thread_id,
            desk = self.desk.step_name(),
            confidence = reply.confidence,
            "desk replied"
        );
        Ok(StateUpdate::new(SupportUpdate {
            active_step_name: Some(Some(self.desk.step_name().to_string())),
            step_response: Some(Some(reply.content)),
            step_metadata: Some(reply.metadata),
            step_confidence: Some(reply.confidence.clamp(0.0, 1.0)),
            ..SupportUpdate::default()
        }))
    }
}

/// Checks the active response against the compliance rules.
///
/// Approved replies get their required notices appended here. Replies with
/// issues keep their text and set `is_approved = false` so the run pauses
/// for a reviewer.
pub struct ComplianceStep {
    rules: Arc<ComplianceRules>,
}

impl ComplianceStep {
    pub fn new(rules: Arc<ComplianceRules>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl StepHandler<SupportState> for ComplianceStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        let content = state
            .data
            .step_response
            .as_deref()
            .ok_or_else(|| ParleyError::handler("compliance review needs a response to check"))?;
        let product_type = state
            .data
            .step_metadata
            .get("product_type")
            .and_then(Value::as_str);

        let review = self.rules.review(content, product_type);
        let approved = review.is_approved();
        if approved {
            tracing::info!(thread_id = ctx.thread_id, notices = review.notices.len(), "compliance passed");
        } else {
            tracing::warn!(thread_id = ctx.thread_id, issues = ?review.issues, "compliance needs review");
        }

        Ok(StateUpdate::new(SupportUpdate {
            step_response: approved.then(|| Some(append_notices(content, &review.notices))),
            is_approved: Some(approved),
            required_notices: Some(review.notices.clone()),
            compliance: Some(Some(review)),
            ..SupportUpdate::default()
        }))
    }
}

/// Runs only once a reviewer has resumed the thread.
pub struct HumanApprovalStep {
    rules: Arc<ComplianceRules>,
}

impl HumanApprovalStep {
    pub fn new(rules: Arc<ComplianceRules>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl StepHandler<SupportState> for HumanApprovalStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        let data = &state.data;
        let mut metadata = data.step_metadata.clone();
        metadata.insert("reviewed".to_string(), Value::Bool(true));
        metadata.insert("escalated".to_string(), Value::Bool(!data.is_approved));

        let response = if data.is_approved {
            let reply = data.step_response.as_deref().unwrap_or(NO_RESPONSE);
            append_notices(reply, &data.required_notices)
        } else {
            self.rules.decline_message().to_string()
        };
        tracing::info!(thread_id = ctx.thread_id, approved = data.is_approved, "review applied");

        Ok(StateUpdate::new(SupportUpdate {
            active_step_name: Some(Some(HUMAN_APPROVAL.to_string())),
            step_response: Some(Some(response)),
            step_metadata: Some(metadata),
            ..SupportUpdate::default()
        }))
    }
}

/// Seals the final output unless the guardrail already did.
pub struct EndStep;

#[async_trait]
impl StepHandler<SupportState> for EndStep {
    async fn invoke(
        &self,
        state: GraphState<SupportState>,
        _ctx: StepContext,
    ) -> Result<StateUpdate<SupportState>, ParleyError> {
        let data = state.data;
        if data.final_output.is_some() {
            return Ok(StateUpdate::empty());
        }

        let mut metadata = Map::new();
        metadata.insert("intent_confidence".to_string(), json!(data.intent_confidence));
        metadata.insert("is_approved".to_string(), json!(data.is_approved));
        metadata.insert("required_notices".to_string(), json!(data.required_notices));
        if let Some(escalation_id) = data.step_metadata.get("escalation_id") {
            metadata.insert("escalation_id".to_string(), escalation_id.clone());
        }
        if let Some(review) = &data.compliance {
            metadata.insert("compliance_issues".to_string(), json!(review.issues));
        }
        metadata.insert("handler".to_string(), Value::Object(data.step_metadata));

        Ok(StateUpdate::new(SupportUpdate {
            final_output: Some(Some(FinalOutput {
                message: data.step_response.unwrap_or_else(|| NO_RESPONSE.to_string()),
                step_name: END.to_string(),
                handled_by: data.active_step_name,
                intent: data.intent,
                confidence: data.step_confidence,
                metadata,
            })),
            ..SupportUpdate::default()
        }))
    }
}
