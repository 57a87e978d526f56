#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use parley_graph::{
    GraphBuilder, GraphState, ParleyError, RunOutput, RunResult, StateSchema, StateUpdate,
    StepContext, StepHandler,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct DemoState {
    pub executed: Vec<String>,
    pub route: Option<String>,
    pub note: Option<String>,
    pub output: Option<String>,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct DemoUpdate {
    pub executed: Option<Vec<String>>,
    pub route: Option<String>,
    pub note: Option<String>,
    pub output: Option<String>,
}

impl StateSchema for DemoState {
    type Update = DemoUpdate;

    fn apply(current: &Self, update: DemoUpdate) -> Self {
        Self {
            executed: update.executed.unwrap_or_else(|| current.executed.clone()),
            route: update.route.or_else(|| current.route.clone()),
            note: update.note.or_else(|| current.note.clone()),
            output: update.output.or_else(|| current.output.clone()),
        }
    }
}

impl RunOutput for DemoState {
    type Output = String;

    fn final_output(&self) -> Option<String> {
        self.output.clone()
    }
}

fn recorded(state: &GraphState<DemoState>, name: &str) -> Vec<String> {
    let mut executed = state.data.executed.clone();
    executed.push(name.to_string());
    executed
}

/// Appends its own name to `executed`.
pub struct Record(pub &'static str);

#[async_trait]
impl StepHandler<DemoState> for Record {
    async fn invoke(
        &self,
        state: GraphState<DemoState>,
        _ctx: StepContext,
    ) -> Result<StateUpdate<DemoState>, ParleyError> {
        Ok(StateUpdate::new(DemoUpdate {
            executed: Some(recorded(&state, self.0)),
            ..DemoUpdate::default()
        }))
    }
}

/// Terminal step: records itself and seals the output.
pub struct Finish;

#[async_trait]
impl StepHandler<DemoState> for Finish {
    async fn invoke(
        &self,
        state: GraphState<DemoState>,
        _ctx: StepContext,
    ) -> Result<StateUpdate<DemoState>, ParleyError> {
        let executed = recorded(&state, "end");
        let mut output = executed.join(">");
        if let Some(note) = &state.data.note {
            output = format!("{output} ({note})");
        }
        Ok(StateUpdate::new(DemoUpdate {
            executed: Some(executed),
            output: Some(output),
            ..DemoUpdate::default()
        }))
    }
}

pub struct Fail(pub &'static str);

#[async_trait]
impl StepHandler<DemoState> for Fail {
    async fn invoke(
        &self,
        _state: GraphState<DemoState>,
        _ctx: StepContext,
    ) -> Result<StateUpdate<DemoState>, ParleyError> {
        Err(ParleyError::handler(self.0))
    }
}

pub struct Sleep {
    pub name: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl StepHandler<DemoState> for Sleep {
    async fn invoke(
        &self,
        state: GraphState<DemoState>,
        _ctx: StepContext,
    ) -> Result<StateUpdate<DemoState>, ParleyError> {
        tokio::time::sleep(self.delay).await;
        Ok(StateUpdate::new(DemoUpdate {
            executed: Some(recorded(&state, self.name)),
            ..DemoUpdate::default()
        }))
    }
}

pub fn route_field(state: &GraphState<DemoState>) -> String {
    state.data.route.clone().unwrap_or_default()
}

/// start -> {a | b} -> review(pause) -> end, with `a`/`b` chosen by `route`.
pub fn review_graph() -> GraphBuilder<DemoState> {
    GraphBuilder::new()
        .add_step("start", Record("start"))
        .add_step("a", Record("a"))
        .add_step("b", Record("b"))
        .add_step("review", Record("review"))
        .add_step("end", Finish)
        .set_entry("start")
        .set_terminal("end")
        .add_conditional_edge("start", route_field, [("a", "a"), ("b", "b")])
        .add_edge("a", "review")
        .add_edge("b", "end")
        .add_edge("review", "end")
        .mark_pause_before("review")
}

pub fn state_with_route(route: &str) -> GraphState<DemoState> {
    GraphState::new(DemoState {
        route: Some(route.to_string()),
        ..DemoState::default()
    })
}

pub fn executed(result: &RunResult<DemoState>) -> Vec<String> {
    result.state().data.executed.clone()
}
