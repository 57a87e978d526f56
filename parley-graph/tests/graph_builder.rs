mod common;

use common::{route_field, review_graph, DemoState, Finish, Record};
use parley_graph::{BuildError, DeclaredRouter, EdgeView, GraphBuilder, GraphState};

#[test]
fn builds_valid_graph_and_exposes_structure() {
    let graph = review_graph().build().unwrap();

    assert_eq!(graph.entry(), "start");
    assert_eq!(graph.terminal(), "end");
    assert!(graph.is_pause_point("review"));
    assert!(!graph.is_pause_point("a"));
    assert_eq!(graph.step_names(), vec!["a", "b", "end", "review", "start"]);
    assert!(graph.edges().contains(&EdgeView {
        from: "start".to_string(),
        to: "a".to_string(),
        label: Some("a".to_string()),
    }));
    assert!(graph.edges().contains(&EdgeView {
        from: "review".to_string(),
        to: "end".to_string(),
        label: None,
    }));
}

#[test]
fn missing_entry_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("end", Finish)
        .set_terminal("end")
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::MissingEntry);
}

#[test]
fn missing_terminal_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("end", Finish)
        .set_entry("end")
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::MissingTerminal);
}

#[test]
fn edge_to_undeclared_step_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "ghost")
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BuildError::UnknownStep {
            step: "ghost".to_string(),
            referenced_by: "start".to_string(),
        }
    );
}

#[test]
fn duplicate_step_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("end", Finish)
        .add_step("end", Finish)
        .set_entry("end")
        .set_terminal("end")
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::DuplicateStep { step: "end".to_string() });
}

#[test]
fn fixed_and_conditional_edge_on_same_step_conflict() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "end")
        .add_conditional_edge("start", route_field, [("x", "end")])
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::ConflictingEdges { step: "start".to_string() });
}

#[test]
fn declared_router_label_missing_from_map_is_rejected() {
    let router = DeclaredRouter::new(["left", "right"], |_: &GraphState<DemoState>| {
        "left".to_string()
    });
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_conditional_edge("start", router, [("left", "end")])
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BuildError::UnmappedLabel {
            step: "start".to_string(),
            label: "right".to_string(),
        }
    );
}

#[test]
fn unreachable_terminal_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "start")
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BuildError::UnreachableTerminal {
            entry: "start".to_string(),
            terminal: "end".to_string(),
        }
    );
}

#[test]
fn step_without_outgoing_edge_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("orphan", Record("orphan"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "end")
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::DeadEnd { step: "orphan".to_string() });
}

#[test]
fn terminal_with_outgoing_edge_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "end")
        .add_edge("end", "start")
        .build()
        .err()
        .unwrap();
    assert_eq!(err, BuildError::TerminalHasEdge { step: "end".to_string() });
}

#[test]
fn unreachable_pause_point_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("island", Record("island"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_edge("start", "end")
        .add_edge("island", "end")
        .mark_pause_before("island")
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BuildError::UnreachablePausePoint {
            step: "island".to_string()
        }
    );
}

#[test]
fn pause_point_without_path_to_terminal_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("start", Record("start"))
        .add_step("trap", Record("trap"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_conditional_edge("start", route_field, [("trap", "trap"), ("done", "end")])
        .add_edge("trap", "trap")
        .mark_pause_before("trap")
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BuildError::PausePointWithoutExit {
            step: "trap".to_string()
        }
    );
}

#[test]
fn undeclared_pause_point_is_rejected() {
    let err = GraphBuilder::<DemoState>::new()
        .add_step("end", Finish)
        .set_entry("end")
        .set_terminal("end")
        .mark_pause_before("ghost")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, BuildError::UnknownStep { step, .. } if step == "ghost"));
}
