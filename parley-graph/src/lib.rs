mod config;
mod error;
mod executor;
mod file_checkpointer;
mod graph;
mod locks;
mod observer;
mod resume;
mod router;
mod validate;

pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::{BuildError, GraphError};
pub use executor::{Executor, RunResult};
pub use file_checkpointer::FileCheckpointer;
pub use graph::{EdgeView, GraphBuilder, StepGraph};
pub use locks::ThreadLocks;
pub use observer::{NoopObserver, Observer, TracingObserver};
pub use router::{DeclaredRouter, Router};

pub use parley_core::{
    CancellationToken, Checkpoint, Checkpointer, GraphState, InMemoryCheckpointer, ParleyError,
    RunOutput, StateSchema, StateUpdate, StepContext, StepHandler, ThreadId,
};
