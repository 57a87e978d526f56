use parley_core::{RunOutput, StateSchema, ThreadId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compliance::ComplianceReview;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The reply a run hands back to the customer.
///
/// `step_name` is the step that sealed the output: `end` for a normal run,
/// `guardrail` when the message was refused. `handled_by` names the handler
/// step whose response is being returned.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FinalOutput {
    pub message: String,
    pub step_name: String,
    pub handled_by: Option<String>,
    pub intent: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// State threaded through one support run.
///
/// `message`, `customer_id`, `thread_id` and `history` are fixed when the run
/// starts; [`SupportUpdate`] has no fields for them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupportState {
    pub message: String,
    pub customer_id: i64,
    pub thread_id: ThreadId,
    pub history: Vec<ChatTurn>,
    /// `message` with PII masked, set by the guardrail when anything was redacted.
    pub redacted_message: Option<String>,
    pub intent: Option<String>,
    pub intent_confidence: f64,
    pub active_step_name: Option<String>,
    pub step_response: Option<String>,
    pub step_metadata: Map<String, Value>,
    pub step_confidence: f64,
    pub is_approved: bool,
    pub required_notices: Vec<String>,
    pub compliance: Option<ComplianceReview>,
    pub final_output: Option<FinalOutput>,
}

impl Default for SupportState {
    fn default() -> Self {
        Self {
            message: String::new(),
            customer_id: 0,
            thread_id: 0,
            history: Vec::new(),
            redacted_message: None,
            intent: None,
            intent_confidence: 0.0,
            active_step_name: None,
            step_response: None,
            step_metadata: Map::new(),
            step_confidence: 0.0,
            is_approved: true,
            required_notices: Vec::new(),
            compliance: None,
            final_output: None,
        }
    }
}

impl SupportState {
    pub fn new(thread_id: ThreadId, customer_id: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            customer_id,
            thread_id,
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    /// The text handlers are allowed to see.
    pub fn handler_message(&self) -> &str {
        self.redacted_message.as_deref().unwrap_or(&self.message)
    }
}

/// A partial [`SupportState`]. Every `Some` field replaces the whole current value.
///
/// Nullable state fields take `Option<Option<T>>`: `Some(None)` clears the
/// field, `None` leaves it untouched. In JSON an explicit `null` clears and an
/// absent key keeps.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupportUpdate {
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub redacted_message: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub intent: Option<Option<String>>,
    pub intent_confidence: Option<f64>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub active_step_name: Option<Option<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub step_response: Option<Option<String>>,
    pub step_metadata: Option<Map<String, Value>>,
    pub step_confidence: Option<f64>,
    pub is_approved: Option<bool>,
    pub required_notices: Option<Vec<String>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Option<ComplianceReview>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub final_output: Option<Option<FinalOutput>>,
}

impl SupportUpdate {
    /// Correction that approves a paused run as-is.
    pub fn approve() -> Self {
        Self {
            is_approved: Some(true),
            ..Self::default()
        }
    }

    /// Correction that approves a paused run with a reviewer-edited reply.
    pub fn approve_with_response(response: impl Into<String>) -> Self {
        Self {
            is_approved: Some(true),
            step_response: Some(Some(response.into())),
            ..Self::default()
        }
    }

    pub fn reject() -> Self {
        Self {
            is_approved: Some(false),
            ..Self::default()
        }
    }
}

impl StateSchema for SupportState {
    type Update = SupportUpdate;

    fn apply(current: &Self, update: SupportUpdate) -> Self {
        let current = current.clone();
        Self {
            redacted_message: update.redacted_message.unwrap_or(current.redacted_message),
            intent: update.intent.unwrap_or(current.intent),
            intent_confidence: update.intent_confidence.unwrap_or(current.intent_confidence),
            active_step_name: update.active_step_name.unwrap_or(current.active_step_name),
            step_response: update.step_response.unwrap_or(current.step_response),
            step_metadata: update.step_metadata.unwrap_or(current.step_metadata),
            step_confidence: update.step_confidence.unwrap_or(current.step_confidence),
            is_approved: update.is_approved.unwrap_or(current.is_approved),
            required_notices: update.required_notices.unwrap_or(current.required_notices),
            compliance: update.compliance.unwrap_or(current.compliance),
            final_output: update.final_output.unwrap_or(current.final_output),
            ..current
        }
    }
}

impl RunOutput for SupportState {
    type Output = FinalOutput;

    fn final_output(&self) -> Option<FinalOutput> {
        self.final_output.clone()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
