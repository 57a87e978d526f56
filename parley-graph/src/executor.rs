use std::sync::Arc;

use parley_core::{
    CancellationToken, Checkpoint, Checkpointer, GraphState, ParleyError, RunOutput, StateUpdate,
    StepContext, ThreadId,
};
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::checkpoint_error;
use crate::locks::ThreadLocks;
use crate::{ExecutionConfig, ExecutionOptions, GraphError, Observer, StepGraph, TracingObserver};

/// How an invocation of the executor ended.
#[derive(Debug, Clone)]
pub enum RunResult<S: RunOutput> {
    Completed {
        final_output: S::Output,
        state: GraphState<S>,
    },
    Paused {
        pending_step: String,
        state: GraphState<S>,
    },
}

impl<S: RunOutput> RunResult<S> {
    pub fn is_paused(&self) -> bool {
        matches!(self, RunResult::Paused { .. })
    }

    pub fn pending_step(&self) -> Option<&str> {
        match self {
            RunResult::Paused { pending_step, .. } => Some(pending_step),
            RunResult::Completed { .. } => None,
        }
    }

    pub fn final_output(&self) -> Option<&S::Output> {
        match self {
            RunResult::Completed { final_output, .. } => Some(final_output),
            RunResult::Paused { .. } => None,
        }
    }

    pub fn state(&self) -> &GraphState<S> {
        match self {
            RunResult::Completed { state, .. } | RunResult::Paused { state, .. } => state,
        }
    }
}

/// Drives runs of one graph, checkpointing each thread's pause or completion.
///
/// Runs and resumes on one thread id are serialized across this executor and
/// its clones. Executors built separately over the same store do not exclude
/// each other unless they are given the same [`ThreadLocks`] through
/// [`Executor::with_thread_locks`].
pub struct Executor<S: RunOutput> {
    pub(crate) graph: Arc<StepGraph<S>>,
    pub(crate) checkpointer: Arc<dyn Checkpointer<S>>,
    pub(crate) config: ExecutionConfig,
    pub(crate) observer: Arc<dyn Observer>,
    pub(crate) locks: ThreadLocks,
}

impl<S: RunOutput> Clone for Executor<S> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            checkpointer: self.checkpointer.clone(),
            config: self.config.clone(),
            observer: self.observer.clone(),
            locks: self.locks.clone(),
        }
    }
}

/// Where a call to `drive` starts and what it has already been allowed to do.
pub(crate) struct Cursor {
    pub(crate) step: String,
    pub(crate) authorized: Option<String>,
    pub(crate) steps_taken: u64,
}

impl<S: RunOutput> Executor<S> {
    pub fn new<C>(graph: Arc<StepGraph<S>>, checkpointer: C) -> Self
    where
        C: Checkpointer<S> + 'static,
    {
        Self {
            graph,
            checkpointer: Arc::new(checkpointer),
            config: ExecutionConfig::default(),
            observer: Arc::new(TracingObserver),
            locks: ThreadLocks::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Shares per-thread serialization with every other executor holding
    /// the same `locks`.
    pub fn with_thread_locks(mut self, locks: ThreadLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn graph(&self) -> &StepGraph<S> {
        &self.graph
    }

    /// The last checkpoint stored for `thread_id`, paused or completed.
    pub async fn checkpoint(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, GraphError> {
        self.checkpointer
            .load(thread_id)
            .await
            .map_err(checkpoint_error)
    }

    pub async fn run(
        &self,
        thread_id: ThreadId,
        initial: GraphState<S>,
    ) -> Result<RunResult<S>, GraphError> {
        self.run_with_options(thread_id, initial, ExecutionOptions::default())
            .await
    }

    /// Starts a fresh run at the entry step. Any earlier checkpoint for the
    /// thread is overwritten once this run pauses or completes.
    pub async fn run_with_options(
        &self,
        thread_id: ThreadId,
        initial: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<RunResult<S>, GraphError> {
        let _guard = self.locks.acquire(thread_id).await;
        let span = tracing::info_span!("graph_run", thread_id, entry = %self.graph.entry());
        let cursor = Cursor {
            step: self.graph.entry().to_string(),
            authorized: None,
            steps_taken: 0,
        };
        self.drive(thread_id, initial, cursor, options)
            .instrument(span)
            .await
    }

    pub(crate) async fn drive(
        &self,
        thread_id: ThreadId,
        mut state: GraphState<S>,
        cursor: Cursor,
        options: ExecutionOptions,
    ) -> Result<RunResult<S>, GraphError> {
        let config = self.config.merge(&options);
        let observer = options
            .observer
            .clone()
            .unwrap_or_else(|| self.observer.clone());
        let cancellation = options.cancellation.clone().unwrap_or_default();

        let Cursor {
            step: mut current,
            mut authorized,
            mut steps_taken,
        } = cursor;
        let mut executed = 0usize;

        loop {
            if self.graph.is_pause_point(&current) {
                if authorized.as_deref() == Some(current.as_str()) {
                    authorized = None;
                } else {
                    check_cancelled(thread_id, &current, &cancellation, observer.as_ref())?;
                    self.save(
                        observer.as_ref(),
                        Checkpoint::new(thread_id, state.clone(), Some(current.clone()), steps_taken),
                    )
                    .await?;
                    return Ok(RunResult::Paused {
                        pending_step: current,
                        state,
                    });
                }
            }

            if let Some(max) = config.max_steps {
                if executed >= max {
                    let error = GraphError::MaxStepsExceeded { max };
                    observer.on_error(thread_id, &current, &error);
                    return Err(error);
                }
            }

            let update = self
                .invoke_step(thread_id, &current, &state, &config, &cancellation, observer.as_ref())
                .await?;
            state = state.apply(update);
            executed += 1;
            steps_taken += 1;

            if current == self.graph.terminal() {
                let Some(final_output) = state.data.final_output() else {
                    let error = GraphError::MissingFinalOutput { terminal: current };
                    observer.on_error(thread_id, self.graph.terminal(), &error);
                    return Err(error);
                };
                check_cancelled(thread_id, &current, &cancellation, observer.as_ref())?;
                self.save(
                    observer.as_ref(),
                    Checkpoint::new(thread_id, state.clone(), None, steps_taken),
                )
                .await?;
                return Ok(RunResult::Completed {
                    final_output,
                    state,
                });
            }

            let next = match self.graph.next_step(&current, &state) {
                Ok(next) => next,
                Err(error) => {
                    observer.on_error(thread_id, &current, &error);
                    return Err(error);
                }
            };
            observer.on_route(thread_id, &current, &next);
            current = next;
        }
    }

    async fn invoke_step(
        &self,
        thread_id: ThreadId,
        step: &str,
        state: &GraphState<S>,
        config: &ExecutionConfig,
        cancellation: &CancellationToken,
        observer: &dyn Observer,
    ) -> Result<StateUpdate<S>, GraphError> {
        let handler = self.graph.handler(step).ok_or_else(|| {
            GraphError::Build(crate::BuildError::UnknownStep {
                step: step.to_string(),
                referenced_by: "executor".to_string(),
            })
        })?;

        let mut ctx = StepContext::new(thread_id, step).with_cancellation(cancellation.child_token());
        if let Some(timeout) = config.step_timeout {
            ctx = ctx.with_deadline(Instant::now() + timeout);
        }

        observer.on_step_start(thread_id, step);
        let started = Instant::now();
        let span = tracing::info_span!("graph_step", thread_id, step);
        let invocation = handler.invoke(state.clone(), ctx);

        let outcome = async {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(GraphError::Cancelled {
                    step: step.to_string(),
                }),
                result = with_timeout(step, invocation, config.step_timeout) => result,
            }
        }
        .instrument(span)
        .await;

        match outcome {
            Ok(update) => {
                observer.on_step_end(thread_id, step, started.elapsed());
                Ok(update)
            }
            Err(error) => {
                observer.on_error(thread_id, step, &error);
                Err(error)
            }
        }
    }

    async fn save(&self, observer: &dyn Observer, checkpoint: Checkpoint<S>) -> Result<(), GraphError> {
        self.checkpointer
            .save(&checkpoint)
            .await
            .map_err(checkpoint_error)?;
        observer.on_checkpoint_saved(checkpoint.thread_id, checkpoint.pending_step.as_deref());
        Ok(())
    }
}

/// A cancelled invocation must not leave a checkpoint behind, even when the
/// token fired after the last step had already returned.
fn check_cancelled(
    thread_id: ThreadId,
    step: &str,
    cancellation: &CancellationToken,
    observer: &dyn Observer,
) -> Result<(), GraphError> {
    if !cancellation.is_cancelled() {
        return Ok(());
    }
    let error = GraphError::Cancelled {
        step: step.to_string(),
    };
    observer.on_error(thread_id, step, &error);
    Err(error)
}

async fn with_timeout<F, T>(
    step: &str,
    invocation: F,
    timeout: Option<std::time::Duration>,
) -> Result<T, GraphError>
where
    F: std::future::Future<Output = Result<T, ParleyError>>,
{
    let result = match timeout {
        Some(after) => match tokio::time::timeout(after, invocation).await {
            Ok(result) => result,
            Err(_) => {
                return Err(GraphError::StepTimedOut {
                    step: step.to_string(),
                    after,
                })
            }
        },
        None => invocation.await,
    };

    result.map_err(|source| match source {
        ParleyError::Cancelled => GraphError::Cancelled {
            step: step.to_string(),
        },
        ParleyError::Timeout(after) => GraphError::StepTimedOut {
            step: step.to_string(),
            after,
        },
        source => GraphError::StepFailed {
            step: step.to_string(),
            source,
        },
    })
}
