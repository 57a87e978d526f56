use std::sync::Arc;

use parley_core::{Checkpoint, Checkpointer, GraphState, ThreadId};
use parley_graph::{
    DeclaredRouter, ExecutionConfig, ExecutionOptions, Executor, GraphBuilder, GraphError,
    RunResult, StepGraph, ThreadLocks,
};

use crate::compliance::ComplianceRules;
use crate::config::SupportConfig;
use crate::guardrail::Guardrail;
use crate::handlers::{AccountDesk, EscalationDesk, GeneralDesk, IntentClassifier, ProductDesk};
use crate::routing;
use crate::state::{ChatTurn, SupportState, SupportUpdate};
use crate::steps::{
    self, ClassifyStep, ComplianceStep, Desk, DeskStep, EndStep, GuardrailStep, HumanApprovalStep,
};
use crate::SupportError;

/// The external services the handler steps delegate to.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub account: Arc<dyn AccountDesk>,
    pub general: Arc<dyn GeneralDesk>,
    pub product: Arc<dyn ProductDesk>,
    pub escalation: Arc<dyn EscalationDesk>,
}

/// Declares the support graph:
///
/// ```text
/// guardrail -> classify -> {account | general | product | human}
/// guardrail -(blocked)-> end
/// product -> compliance -> {end | human_approval (pause) -> end}
/// account, general, human -> end
/// ```
pub fn build_graph(
    config: &SupportConfig,
    collaborators: Collaborators,
) -> Result<StepGraph<SupportState>, SupportError> {
    config.validate()?;
    let guardrail = Arc::new(Guardrail::new(&config.guardrail)?);
    let rules = Arc::new(ComplianceRules::new(&config.compliance));

    let graph = GraphBuilder::<SupportState>::new()
        .add_step(steps::GUARDRAIL, GuardrailStep::new(guardrail))
        .add_step(steps::CLASSIFY, ClassifyStep::new(collaborators.classifier))
        .add_step(steps::ACCOUNT, DeskStep::new(Desk::Account(collaborators.account)))
        .add_step(steps::GENERAL, DeskStep::new(Desk::General(collaborators.general)))
        .add_step(steps::PRODUCT, DeskStep::new(Desk::Product(collaborators.product)))
        .add_step(steps::HUMAN, DeskStep::new(Desk::Escalation(collaborators.escalation)))
        .add_step(steps::COMPLIANCE, ComplianceStep::new(rules.clone()))
        .add_step(steps::HUMAN_APPROVAL, HumanApprovalStep::new(rules))
        .add_step(steps::END, EndStep)
        .set_entry(steps::GUARDRAIL)
        .set_terminal(steps::END)
        .add_conditional_edge(
            steps::GUARDRAIL,
            DeclaredRouter::new(routing::GUARDRAIL_LABELS, routing::after_guardrail),
            [(routing::BLOCKED, steps::END), (routing::PASS, steps::CLASSIFY)],
        )
        .add_conditional_edge(
            steps::CLASSIFY,
            DeclaredRouter::new(routing::INTENT_LABELS, routing::by_intent),
            [
                (routing::ACCOUNT, steps::ACCOUNT),
                (routing::GENERAL, steps::GENERAL),
                (routing::PRODUCT, steps::PRODUCT),
                (routing::HUMAN, steps::HUMAN),
            ],
        )
        .add_edge(steps::PRODUCT, steps::COMPLIANCE)
        .add_conditional_edge(
            steps::COMPLIANCE,
            DeclaredRouter::new(routing::COMPLIANCE_LABELS, routing::after_compliance),
            [
                (routing::APPROVED, steps::END),
                (routing::REVIEW, steps::HUMAN_APPROVAL),
            ],
        )
        .add_edge(steps::HUMAN_APPROVAL, steps::END)
        .add_edge(steps::ACCOUNT, steps::END)
        .add_edge(steps::GENERAL, steps::END)
        .add_edge(steps::HUMAN, steps::END)
        .mark_pause_before(steps::HUMAN_APPROVAL)
        .build()?;
    Ok(graph)
}

/// Entry point for the message-handling layer: start a run per inbound
/// message, resume it once a reviewer has decided.
#[derive(Clone)]
pub struct SupportWorkflow {
    executor: Executor<SupportState>,
}

impl SupportWorkflow {
    pub fn new<C>(
        config: &SupportConfig,
        collaborators: Collaborators,
        checkpointer: C,
    ) -> Result<Self, SupportError>
    where
        C: Checkpointer<SupportState> + 'static,
    {
        let graph = build_graph(config, collaborators)?;
        Ok(Self {
            executor: Executor::new(Arc::new(graph), checkpointer),
        })
    }

    pub fn with_execution_config(mut self, config: ExecutionConfig) -> Self {
        self.executor = self.executor.with_config(config);
        self
    }

    /// Serializes threads with every other workflow given the same `locks`,
    /// for workflows built separately over one checkpoint store.
    pub fn with_thread_locks(mut self, locks: ThreadLocks) -> Self {
        self.executor = self.executor.with_thread_locks(locks);
        self
    }

    pub fn executor(&self) -> &Executor<SupportState> {
        &self.executor
    }

    pub async fn start_run(
        &self,
        thread_id: ThreadId,
        customer_id: i64,
        message: &str,
        history: Vec<ChatTurn>,
    ) -> Result<RunResult<SupportState>, GraphError> {
        self.start_run_with_options(thread_id, customer_id, message, history, ExecutionOptions::default())
            .await
    }

    pub async fn start_run_with_options(
        &self,
        thread_id: ThreadId,
        customer_id: i64,
        message: &str,
        history: Vec<ChatTurn>,
        options: ExecutionOptions,
    ) -> Result<RunResult<SupportState>, GraphError> {
        let state = SupportState::new(thread_id, customer_id, message).with_history(history);
        self.executor
            .run_with_options(thread_id, GraphState::new(state), options)
            .await
    }

    pub async fn resume_run(
        &self,
        thread_id: ThreadId,
        correction: SupportUpdate,
    ) -> Result<RunResult<SupportState>, GraphError> {
        self.executor.resume(thread_id, correction).await
    }

    pub async fn approve(&self, thread_id: ThreadId) -> Result<RunResult<SupportState>, GraphError> {
        self.resume_run(thread_id, SupportUpdate::approve()).await
    }

    pub async fn reject(&self, thread_id: ThreadId) -> Result<RunResult<SupportState>, GraphError> {
        self.resume_run(thread_id, SupportUpdate::reject()).await
    }

    /// The paused checkpoint awaiting review for `thread_id`, if any.
    pub async fn pending_review(
        &self,
        thread_id: ThreadId,
    ) -> Result<Option<Checkpoint<SupportState>>, GraphError> {
        Ok(self
            .executor
            .checkpoint(thread_id)
            .await?
            .filter(Checkpoint::is_pending))
    }
}
