//! The reference support-chat workflow built on the Parley step engine.
//!
//! A message passes a guardrail, is classified, answered by one desk and,
//! for product recommendations, checked for compliance. Replies that fail a
//! compliance rule pause before `human_approval` until a reviewer resumes
//! the thread.

pub mod compliance;
pub mod config;
mod error;
pub mod guardrail;
pub mod handlers;
pub mod routing;
pub mod state;
pub mod steps;
mod workflow;

pub use compliance::{ComplianceReview, ComplianceRules};
pub use config::{ComplianceConfig, GuardrailConfig, NoticeRule, SupportConfig};
pub use error::SupportError;
pub use guardrail::{Guardrail, Verdict};
pub use handlers::{
    AccountDesk, AgentReply, Classification, EscalationDesk, GeneralDesk, Inquiry,
    IntentClassifier, KeywordIntentClassifier, ProductDesk,
};
pub use state::{ChatTurn, FinalOutput, Role, SupportState, SupportUpdate};
pub use workflow::{build_graph, Collaborators, SupportWorkflow};
