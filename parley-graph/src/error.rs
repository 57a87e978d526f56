use std::time::Duration;

use parley_core::{ParleyError, ThreadId};
use thiserror::Error;

/// A graph declaration that cannot be executed. Raised by `GraphBuilder::build`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("graph has no entry step")]
    MissingEntry,
    #[error("graph has no terminal step")]
    MissingTerminal,
    #[error("step '{step}' declared more than once")]
    DuplicateStep { step: String },
    #[error("'{referenced_by}' references undeclared step '{step}'")]
    UnknownStep { step: String, referenced_by: String },
    #[error("step '{step}' has more than one outgoing edge")]
    ConflictingEdges { step: String },
    #[error("conditional edge from '{step}' has an empty label map")]
    EmptyRouteMap { step: String },
    #[error("router on '{step}' may return '{label}' which is not in its label map")]
    UnmappedLabel { step: String, label: String },
    #[error("terminal step '{step}' must not have outgoing edges")]
    TerminalHasEdge { step: String },
    #[error("step '{step}' has no outgoing edge and is not the terminal step")]
    DeadEnd { step: String },
    #[error("terminal step '{terminal}' is unreachable from entry '{entry}'")]
    UnreachableTerminal { entry: String, terminal: String },
    #[error("pause point '{step}' is unreachable from the entry step")]
    UnreachablePausePoint { step: String },
    #[error("pause point '{step}' has no path to the terminal step")]
    PausePointWithoutExit { step: String },
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid graph: {0}")]
    Build(#[from] BuildError),
    #[error("router on '{step}' returned undeclared label '{label}'")]
    Routing { step: String, label: String },
    #[error("step '{step}' failed: {source}")]
    StepFailed { step: String, source: ParleyError },
    #[error("step '{step}' timed out after {after:?}")]
    StepTimedOut { step: String, after: Duration },
    #[error("step '{step}' was cancelled")]
    Cancelled { step: String },
    #[error("thread {thread_id} has no paused run to resume")]
    NoPendingRun { thread_id: ThreadId },
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
    #[error("Max steps exceeded: limit {max}")]
    MaxStepsExceeded { max: usize },
    #[error("terminal step '{terminal}' finished without a final output")]
    MissingFinalOutput { terminal: String },
}

impl GraphError {
    /// Name of the step the run failed in, when the failure belongs to one.
    pub fn step(&self) -> Option<&str> {
        match self {
            GraphError::Routing { step, .. }
            | GraphError::StepFailed { step, .. }
            | GraphError::StepTimedOut { step, .. }
            | GraphError::Cancelled { step } => Some(step),
            _ => None,
        }
    }
}

pub(crate) fn checkpoint_error(error: ParleyError) -> GraphError {
    GraphError::Checkpoint(error.to_string())
}
