use parley_core::{GraphState, StateSchema};

/// Chooses the label of the next edge from the current state.
///
/// Routers must be pure functions of the state so that a decision can be
/// reproduced from a stored checkpoint.
pub trait Router<S: StateSchema>: Send + Sync {
    fn route(&self, state: &GraphState<S>) -> String;

    /// Every label `route` can return. An empty list leaves the check to run time.
    fn labels(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<S, F> Router<S> for F
where
    S: StateSchema,
    F: Fn(&GraphState<S>) -> String + Send + Sync,
{
    fn route(&self, state: &GraphState<S>) -> String {
        (self)(state)
    }
}

/// A closure router that declares its possible labels up front.
pub struct DeclaredRouter<F> {
    labels: Vec<String>,
    route: F,
}

impl<F> DeclaredRouter<F> {
    pub fn new<I, L>(labels: I, route: F) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            route,
        }
    }
}

impl<S, F> Router<S> for DeclaredRouter<F>
where
    S: StateSchema,
    F: Fn(&GraphState<S>) -> String + Send + Sync,
{
    fn route(&self, state: &GraphState<S>) -> String {
        (self.route)(state)
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }
}
