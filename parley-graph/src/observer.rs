use std::time::Duration;

use parley_core::ThreadId;

use crate::GraphError;

/// Hooks the executor calls around every step of every run.
pub trait Observer: Send + Sync {
    fn on_step_start(&self, _thread_id: ThreadId, _step: &str) {}
    fn on_step_end(&self, _thread_id: ThreadId, _step: &str, _elapsed: Duration) {}
    fn on_route(&self, _thread_id: ThreadId, _from: &str, _to: &str) {}
    fn on_error(&self, _thread_id: ThreadId, _step: &str, _error: &GraphError) {}
    fn on_checkpoint_saved(&self, _thread_id: ThreadId, _pending_step: Option<&str>) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Default observer: structured `tracing` events for each hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_step_start(&self, thread_id: ThreadId, step: &str) {
        tracing::debug!(thread_id, step, "step started");
    }

    fn on_step_end(&self, thread_id: ThreadId, step: &str, elapsed: Duration) {
        tracing::debug!(
            thread_id,
            step,
            elapsed_ms = elapsed.as_millis() as u64,
            "step finished"
        );
    }

    fn on_route(&self, thread_id: ThreadId, from: &str, to: &str) {
        tracing::debug!(thread_id, from, to, "routed");
    }

    fn on_error(&self, thread_id: ThreadId, step: &str, error: &GraphError) {
        tracing::warn!(thread_id, step, error = %error, "step failed, run aborted");
    }

    fn on_checkpoint_saved(&self, thread_id: ThreadId, pending_step: Option<&str>) {
        match pending_step {
            Some(step) => tracing::info!(thread_id, pending_step = step, "run paused"),
            None => tracing::info!(thread_id, "run completed"),
        }
    }
}
