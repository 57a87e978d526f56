mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{review_graph, state_with_route, DemoUpdate};
use parley_graph::{
    ExecutionOptions, Executor, GraphError, InMemoryCheckpointer, Observer, ThreadId,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Observer for Recorder {
    fn on_step_start(&self, _thread_id: ThreadId, step: &str) {
        self.push(format!("start:{step}"));
    }

    fn on_step_end(&self, _thread_id: ThreadId, step: &str, _elapsed: Duration) {
        self.push(format!("end:{step}"));
    }

    fn on_route(&self, _thread_id: ThreadId, from: &str, to: &str) {
        self.push(format!("route:{from}->{to}"));
    }

    fn on_error(&self, _thread_id: ThreadId, step: &str, _error: &GraphError) {
        self.push(format!("error:{step}"));
    }

    fn on_checkpoint_saved(&self, thread_id: ThreadId, pending_step: Option<&str>) {
        self.push(format!("saved:{thread_id}:{}", pending_step.unwrap_or("-")));
    }
}

#[tokio::test]
async fn observer_sees_every_hook_in_order() {
    let recorder = Arc::new(Recorder::default());
    let executor = Executor::new(
        Arc::new(review_graph().build().unwrap()),
        InMemoryCheckpointer::default(),
    );
    let options = ExecutionOptions {
        observer: Some(recorder.clone()),
        ..ExecutionOptions::default()
    };

    executor
        .run_with_options(1, state_with_route("a"), options.clone())
        .await
        .unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "start:start",
            "end:start",
            "route:start->a",
            "start:a",
            "end:a",
            "route:a->review",
            "saved:1:review",
        ]
    );

    executor
        .resume_with_options(1, DemoUpdate::default(), options)
        .await
        .unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "start:review",
            "end:review",
            "route:review->end",
            "start:end",
            "end:end",
            "saved:1:-",
        ]
    );
}

#[tokio::test]
async fn routing_failure_is_reported_to_observer() {
    let recorder = Arc::new(Recorder::default());
    let executor = Executor::new(
        Arc::new(review_graph().build().unwrap()),
        InMemoryCheckpointer::default(),
    );

    executor
        .run_with_options(
            2,
            state_with_route("missing"),
            ExecutionOptions {
                observer: Some(recorder.clone()),
                ..ExecutionOptions::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(recorder.take(), vec!["start:start", "end:start", "error:start"]);
}
