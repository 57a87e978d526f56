use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parley_core::{Checkpoint, Checkpointer, ParleyError, StateSchema, ThreadId};

/// Stores one JSON document per thread under `base_dir`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written checkpoint.
#[derive(Clone, Debug)]
pub struct FileCheckpointer {
    base_dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn thread_path(&self, thread_id: ThreadId) -> PathBuf {
        self.base_dir.join(format!("thread-{thread_id}.json"))
    }

    fn temp_path(&self, thread_id: ThreadId) -> PathBuf {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let seq = NEXT.fetch_add(1, Ordering::Relaxed);
        self.base_dir.join(format!(
            ".thread-{thread_id}.{}.{seq}.tmp",
            std::process::id()
        ))
    }
}

fn io_error(err: std::io::Error) -> ParleyError {
    ParleyError::CheckpointFailed(err.to_string())
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for FileCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), ParleyError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(io_error)?;

        let payload = serde_json::to_vec_pretty(checkpoint).map_err(|err| {
            ParleyError::CheckpointFailed(format!("failed to serialize checkpoint: {err}"))
        })?;
        let temp = self.temp_path(checkpoint.thread_id);
        tokio::fs::write(&temp, payload).await.map_err(io_error)?;
        tokio::fs::rename(&temp, self.thread_path(checkpoint.thread_id))
            .await
            .map_err(io_error)?;
        Ok(())
    }

    async fn load(&self, thread_id: ThreadId) -> Result<Option<Checkpoint<S>>, ParleyError> {
        let bytes = match tokio::fs::read(self.thread_path(thread_id)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(err)),
        };
        let checkpoint = serde_json::from_slice(&bytes).map_err(|err| {
            ParleyError::CheckpointFailed(format!("failed to deserialize checkpoint: {err}"))
        })?;
        Ok(Some(checkpoint))
    }

    async fn clear(&self, thread_id: ThreadId) -> Result<(), ParleyError> {
        match tokio::fs::remove_file(self.thread_path(thread_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}
