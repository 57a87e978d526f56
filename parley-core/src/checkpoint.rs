use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::state::{GraphState, StateSchema};
use crate::ParleyError;

/// Identifies one conversation's run/checkpoint lineage.
pub type ThreadId = i64;

/// The last snapshot of a thread's run.
///
/// `pending_step` names the step a paused run is waiting to execute; it is
/// `None` once the run has completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct Checkpoint<S: StateSchema> {
    pub thread_id: ThreadId,
    pub pending_step: Option<String>,
    pub step: u64,
    pub created_at: String,
    pub state: GraphState<S>,
}

impl<S: StateSchema> Checkpoint<S> {
    pub fn new(
        thread_id: ThreadId,
        state: GraphState<S>,
        pending_step: Option<String>,
        step: u64,
    ) -> Self {
        Self {
            thread_id,
            pending_step,
            step,
            created_at: Utc::now().to_rfc3339(),
            state,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_step.is_some()
    }
}

/// Durable per-thread storage of the last checkpoint.
///
/// A `save` must be visible to any `load` for the same thread issued after it
/// returns. Saving overwrites whatever the thread held before.
#[async_trait::async_trait]
pub trait Checkpointer<S: StateSchema>: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), ParleyError>;
    async fn load(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, ParleyError>;
    async fn clear(&self, thread_id: ThreadId) -> Result<(), ParleyError>;
}

#[async_trait::async_trait]
impl<S: StateSchema, C: Checkpointer<S> + ?Sized> Checkpointer<S> for Arc<C> {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), ParleyError> {
        (**self).save(checkpoint).await
    }

    async fn load(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, ParleyError> {
        (**self).load(thread_id).await
    }

    async fn clear(&self, thread_id: ThreadId) -> Result<(), ParleyError> {
        (**self).clear(thread_id).await
    }
}

#[derive(Clone)]
pub struct InMemoryCheckpointer<S: StateSchema> {
    inner: Arc<RwLock<HashMap<ThreadId, Checkpoint<S>>>>,
}

impl<S: StateSchema> Default for InMemoryCheckpointer<S> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<S: StateSchema> InMemoryCheckpointer<S> {
    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for InMemoryCheckpointer<S> {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), ParleyError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| ParleyError::CheckpointFailed("lock".into()))?;
        guard.insert(checkpoint.thread_id, checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, ParleyError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| ParleyError::CheckpointFailed("lock".into()))?;
        Ok(guard.get(&thread_id).cloned())
    }

    async fn clear(&self, thread_id: ThreadId) -> Result<(), ParleyError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| ParleyError::CheckpointFailed("lock".into()))?;
        guard.remove(&thread_id);
        Ok(())
    }
}
