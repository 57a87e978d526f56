use parley_core::{RunOutput, StateUpdate, ThreadId};
use tracing::Instrument;

use crate::error::checkpoint_error;
use crate::executor::Cursor;
use crate::{ExecutionOptions, Executor, GraphError, RunResult};

impl<S: RunOutput> Executor<S> {
    pub async fn resume(
        &self,
        thread_id: ThreadId,
        correction: S::Update,
    ) -> Result<RunResult<S>, GraphError> {
        self.resume_with_options(thread_id, correction, ExecutionOptions::default())
            .await
    }

    /// Continues a paused run past its pause point.
    ///
    /// `correction` is merged into the checkpointed state with the same
    /// whole-field replacement as a step update, then the pending step runs.
    /// Steps executed before the pause are never repeated.
    pub async fn resume_with_options(
        &self,
        thread_id: ThreadId,
        correction: S::Update,
        options: ExecutionOptions,
    ) -> Result<RunResult<S>, GraphError> {
        let _guard = self.locks.acquire(thread_id).await;

        let checkpoint = self
            .checkpointer
            .load(thread_id)
            .await
            .map_err(checkpoint_error)?
            .ok_or(GraphError::NoPendingRun { thread_id })?;
        let pending = checkpoint
            .pending_step
            .clone()
            .ok_or(GraphError::NoPendingRun { thread_id })?;
        if !self.graph.contains_step(&pending) {
            return Err(GraphError::Checkpoint(format!(
                "checkpoint for thread {thread_id} is paused before unknown step '{pending}'"
            )));
        }

        let span = tracing::info_span!("graph_resume", thread_id, pending_step = %pending);
        tracing::info!(parent: &span, thread_id, pending_step = %pending, "resuming paused run");

        let state = checkpoint.state.apply(StateUpdate::new(correction));
        let cursor = Cursor {
            step: pending.clone(),
            authorized: Some(pending),
            steps_taken: checkpoint.step,
        };
        self.drive(thread_id, state, cursor, options)
            .instrument(span)
            .await
    }

    /// Whether `thread_id` has a run waiting at a pause point.
    pub async fn pending_step(&self, thread_id: ThreadId) -> Result<Option<String>, GraphError> {
        Ok(self
            .checkpoint(thread_id)
            .await?
            .and_then(|checkpoint| checkpoint.pending_step))
    }
}
