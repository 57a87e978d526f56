//! Collaborator interfaces the workflow's handler steps call into.
//!
//! Concrete account lookups, FAQ search, product catalogues and escalation
//! ticketing live outside this crate; they plug in through these traits.

use async_trait::async_trait;
use parley_core::{ParleyError, ThreadId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::ChatTurn;

/// What a desk answers with.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentReply {
    pub content: String,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentReply {
    pub fn new(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            content: content.into(),
            confidence,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub intent: String,
    pub confidence: f64,
}

/// The customer request as handlers see it. `message` is already redacted.
#[derive(Clone, Copy, Debug)]
pub struct Inquiry<'a> {
    pub thread_id: ThreadId,
    pub customer_id: i64,
    pub message: &'a str,
    pub history: &'a [ChatTurn],
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, inquiry: Inquiry<'_>) -> Result<Classification, ParleyError>;
}

#[async_trait]
pub trait AccountDesk: Send + Sync {
    async fn answer(&self, inquiry: Inquiry<'_>) -> Result<AgentReply, ParleyError>;
}

#[async_trait]
pub trait GeneralDesk: Send + Sync {
    async fn answer(&self, inquiry: Inquiry<'_>) -> Result<AgentReply, ParleyError>;
}

/// Product recommendations. Put the product family in `metadata["product_type"]`
/// (`loan`, `credit`, `investment`, `savings`) so compliance can require its notice.
#[async_trait]
pub trait ProductDesk: Send + Sync {
    async fn recommend(&self, inquiry: Inquiry<'_>) -> Result<AgentReply, ParleyError>;
}

/// Hands the conversation to a human. Replies should carry `metadata["escalation_id"]`.
#[async_trait]
pub trait EscalationDesk: Send + Sync {
    async fn escalate(&self, inquiry: Inquiry<'_>) -> Result<AgentReply, ParleyError>;
}

const KEYWORD_CONFIDENCE: f64 = 0.85;
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// First-match keyword classifier.
///
/// Rules are checked in order, so urgent complaints win over everything
/// else. Messages matching nothing are `general_inquiry`.
#[derive(Clone, Debug)]
pub struct KeywordIntentClassifier {
    rules: Vec<(String, Vec<String>)>,
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        let rule = |intent: &str, keywords: &[&str]| {
            (
                intent.to_string(),
                keywords.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            )
        };
        Self {
            rules: vec![
                rule(
                    "complaint",
                    &[
                        "complaint",
                        "unhappy",
                        "not happy",
                        "disappointed",
                        "taking too long",
                        "stolen",
                        "urgent",
                        "emergency",
                    ],
                ),
                rule(
                    "account_data",
                    &[
                        "balance",
                        "transaction",
                        "statement",
                        "my account",
                        "how much can i spend",
                    ],
                ),
                rule("credit_card", &["credit card", "credit limit"]),
                rule(
                    "product_acquisition",
                    &["loan", "mortgage", "borrow", "interest rate", "savings account"],
                ),
            ],
        }
    }
}

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule checked after the existing ones.
    pub fn with_rule<I, K>(mut self, intent: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.rules.push((
            intent.into(),
            keywords
                .into_iter()
                .map(|keyword| keyword.into().to_lowercase())
                .collect(),
        ));
        self
    }

    pub fn classify_text(&self, message: &str) -> Classification {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword.as_str())))
            .map(|(intent, _)| Classification {
                intent: intent.clone(),
                confidence: KEYWORD_CONFIDENCE,
            })
            .unwrap_or_else(|| Classification {
                intent: "general_inquiry".to_string(),
                confidence: FALLBACK_CONFIDENCE,
            })
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, inquiry: Inquiry<'_>) -> Result<Classification, ParleyError> {
        Ok(self.classify_text(inquiry.message))
    }
}
