mod common;

use std::sync::Arc;

use common::{executed, review_graph, state_with_route, DemoState, DemoUpdate, Fail, Finish, Record};
use parley_graph::{
    Checkpointer, Executor, GraphBuilder, GraphError, GraphState, InMemoryCheckpointer,
    ParleyError, StateUpdate, StepContext,
};

#[tokio::test]
async fn linear_run_completes_and_stores_final_checkpoint() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("middle", Record("middle"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "middle")
        .add_edge("middle", "end")
        .build()
        .unwrap();
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(graph), store.clone());

    let result = executor
        .run(1, GraphState::new(DemoState::default()))
        .await
        .unwrap();

    assert!(!result.is_paused());
    assert_eq!(result.final_output().unwrap(), "start>middle>end");
    assert_eq!(executed(&result), vec!["start", "middle", "end"]);

    let checkpoint = store.load(1).await.unwrap().unwrap();
    assert_eq!(checkpoint.pending_step, None);
    assert_eq!(checkpoint.step, 3);
    assert_eq!(checkpoint.state.data.output.as_deref(), Some("start>middle>end"));
}

#[tokio::test]
async fn conditional_edge_follows_router_label() {
    let executor = Executor::new(
        Arc::new(review_graph().build().unwrap()),
        InMemoryCheckpointer::default(),
    );

    let result = executor.run(7, state_with_route("b")).await.unwrap();

    assert_eq!(executor.graph().entry(), "start");
    assert_eq!(executed(&result), vec!["start", "b", "end"]);
    assert_eq!(result.final_output().unwrap(), "start>b>end");
}

#[tokio::test]
async fn router_sees_update_of_the_step_it_follows() {
    let decide = |_state: GraphState<DemoState>, _ctx: StepContext| async move {
        Ok::<_, ParleyError>(StateUpdate::new(DemoUpdate {
            route: Some("b".to_string()),
            ..DemoUpdate::default()
        }))
    };
    let graph = GraphBuilder::<DemoState>::new()
        .add_step("start", decide)
        .add_step("a", Record("a"))
        .add_step("b", Record("b"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_conditional_edge("start", common::route_field, [("a", "a"), ("b", "b")])
        .add_edge("a", "end")
        .add_edge("b", "end")
        .build()
        .unwrap();
    let executor = Executor::new(Arc::new(graph), InMemoryCheckpointer::default());

    let result = executor.run(1, state_with_route("a")).await.unwrap();

    assert_eq!(executed(&result), vec!["b", "end"]);
}

#[tokio::test]
async fn unmapped_label_fails_run_without_checkpoint() {
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(review_graph().build().unwrap()), store.clone());

    let err = executor.run(3, state_with_route("c")).await.unwrap_err();

    match &err {
        GraphError::Routing { step, label } => {
            assert_eq!(step, "start");
            assert_eq!(label, "c");
        }
        other => panic!("expected routing error, got {other:?}"),
    }
    assert_eq!(err.step(), Some("start"));
    assert!(store.load(3).await.unwrap().is_none());
}

#[tokio::test]
async fn handler_failure_names_step_and_writes_nothing() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("broken", Fail("upstream unavailable"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "broken")
        .add_edge("broken", "end")
        .build()
        .unwrap();
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(graph), store.clone());

    let err = executor
        .run(4, GraphState::new(DemoState::default()))
        .await
        .unwrap_err();

    match err {
        GraphError::StepFailed { step, source } => {
            assert_eq!(step, "broken");
            assert!(source.to_string().contains("upstream unavailable"));
        }
        other => panic!("expected step failure, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_run_leaves_previous_checkpoint_untouched() {
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(review_graph().build().unwrap()), store.clone());

    let first = executor.run(5, state_with_route("b")).await.unwrap();
    assert!(!first.is_paused());
    let before = store.load(5).await.unwrap().unwrap();

    executor.run(5, state_with_route("nowhere")).await.unwrap_err();

    let after = store.load(5).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn terminal_without_output_is_an_error() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Record("end"))
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "end")
        .build()
        .unwrap();
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(graph), store.clone());

    let err = executor
        .run(6, GraphState::new(DemoState::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::MissingFinalOutput { terminal } if terminal == "end"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn threads_keep_separate_checkpoints() {
    let store = InMemoryCheckpointer::<DemoState>::default();
    let executor = Executor::new(Arc::new(review_graph().build().unwrap()), store.clone());

    executor.run(10, state_with_route("a")).await.unwrap();
    executor.run(11, state_with_route("b")).await.unwrap();

    assert_eq!(executor.pending_step(10).await.unwrap().as_deref(), Some("review"));
    assert_eq!(executor.pending_step(11).await.unwrap(), None);
    assert_eq!(store.len(), 2);
}
