use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{GraphState, ParleyError, StateSchema, StateUpdate, ThreadId};

/// Per-invocation context handed to every step handler.
#[derive(Clone, Debug)]
pub struct StepContext {
    pub thread_id: ThreadId,
    pub step: String,
    pub deadline: Option<Instant>,
    pub cancellation: CancellationToken,
}

impl StepContext {
    pub fn new(thread_id: ThreadId, step: impl Into<String>) -> Self {
        Self {
            thread_id,
            step: step.into(),
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Time left before the deadline, `None` when the step is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// A named unit of work in a graph.
///
/// Handlers receive an owned snapshot of the state and influence the run only
/// through the update they return.
#[async_trait]
pub trait StepHandler<S: StateSchema>: Send + Sync {
    async fn invoke(
        &self,
        state: GraphState<S>,
        ctx: StepContext,
    ) -> Result<StateUpdate<S>, ParleyError>;
}

#[async_trait]
impl<S, F, Fut> StepHandler<S> for F
where
    S: StateSchema,
    F: Fn(GraphState<S>, StepContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateUpdate<S>, ParleyError>> + Send,
{
    async fn invoke(
        &self,
        state: GraphState<S>,
        ctx: StepContext,
    ) -> Result<StateUpdate<S>, ParleyError> {
        (self)(state, ctx).await
    }
}
