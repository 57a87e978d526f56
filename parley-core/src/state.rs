use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// The typed record threaded through a run.
///
/// `Update` is the partial record a step returns. `apply` must replace whole
/// fields: a field present in the update overwrites the current value and
/// nested contents are never merged.
pub trait StateSchema:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + std::fmt::Debug + 'static
{
    type Update: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Send
        + Sync
        + std::fmt::Debug
        + 'static;

    fn apply(current: &Self, update: Self::Update) -> Self;
}

/// A state record that can produce the final answer of a completed run.
pub trait RunOutput: StateSchema {
    type Output: Serialize + DeserializeOwned + Clone + Send + Sync + std::fmt::Debug + 'static;

    fn final_output(&self) -> Option<Self::Output>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct GraphState<S: StateSchema> {
    pub data: S,
}

impl<S: StateSchema> GraphState<S> {
    pub fn new(data: S) -> Self {
        Self { data }
    }

    pub fn apply(self, update: StateUpdate<S>) -> Self {
        Self {
            data: S::apply(&self.data, update.data),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct StateUpdate<S: StateSchema> {
    pub data: S::Update,
}

impl<S: StateSchema> StateUpdate<S> {
    pub fn new(data: S::Update) -> Self {
        Self { data }
    }

    pub fn empty() -> Self {
        Self {
            data: S::Update::default(),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
