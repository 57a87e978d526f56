use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use parley_core::ThreadId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per thread id so that at most one run or resume is in
/// flight for a thread. Different threads never contend.
///
/// Clones share the same table. Executors only exclude each other when they
/// hold clones of one `ThreadLocks`; see [`Executor::with_thread_locks`].
///
/// [`Executor::with_thread_locks`]: crate::Executor::with_thread_locks
#[derive(Clone, Default)]
pub struct ThreadLocks {
    inner: Arc<Mutex<AHashMap<ThreadId, Arc<AsyncMutex<()>>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn acquire(&self, thread_id: ThreadId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the map belong to idle threads.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(thread_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
