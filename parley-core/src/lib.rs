pub mod checkpoint;
mod error;
pub mod state;
pub mod step;

pub use checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer, ThreadId};
pub use error::ParleyError;
pub use state::{GraphState, RunOutput, StateSchema, StateUpdate};
pub use step::{StepContext, StepHandler};
pub use tokio_util::sync::CancellationToken;
