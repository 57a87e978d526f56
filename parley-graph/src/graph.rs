use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use parley_core::{GraphState, StateSchema, StepHandler};

use crate::router::Router;
use crate::validate::validate;
use crate::{BuildError, GraphError};

pub(crate) enum Transition<S: StateSchema> {
    Fixed(String),
    Conditional {
        router: Box<dyn Router<S>>,
        routes: BTreeMap<String, String>,
    },
}

/// Declares steps, edges and pause points, then validates them into a
/// [`StepGraph`].
pub struct GraphBuilder<S: StateSchema> {
    steps: Vec<(String, Box<dyn StepHandler<S>>)>,
    transitions: Vec<(String, Transition<S>)>,
    entry: Option<String>,
    terminal: Option<String>,
    pause_before: Vec<String>,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            transitions: Vec::new(),
            entry: None,
            terminal: None,
            pause_before: Vec::new(),
        }
    }

    pub fn add_step<H>(mut self, name: &str, handler: H) -> Self
    where
        H: StepHandler<S> + 'static,
    {
        self.steps.push((name.to_string(), Box::new(handler)));
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn set_terminal(mut self, name: &str) -> Self {
        self.terminal = Some(name.to_string());
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.transitions
            .push((from.to_string(), Transition::Fixed(to.to_string())));
        self
    }

    /// Routes out of `from` by evaluating `router` and looking its label up in `routes`.
    pub fn add_conditional_edge<R, I, L, T>(mut self, from: &str, router: R, routes: I) -> Self
    where
        R: Router<S> + 'static,
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(label, to)| (label.into(), to.into()))
            .collect();
        self.transitions.push((
            from.to_string(),
            Transition::Conditional {
                router: Box::new(router),
                routes,
            },
        ));
        self
    }

    /// Requires external authorization before `name` may execute.
    pub fn mark_pause_before(mut self, name: &str) -> Self {
        self.pause_before.push(name.to_string());
        self
    }

    pub fn build(self) -> Result<StepGraph<S>, BuildError> {
        validate(
            &self.steps,
            &self.transitions,
            self.entry.as_deref(),
            self.terminal.as_deref(),
            &self.pause_before,
        )?;

        let entry = self.entry.ok_or(BuildError::MissingEntry)?;
        let terminal = self.terminal.ok_or(BuildError::MissingTerminal)?;
        Ok(StepGraph {
            steps: self.steps.into_iter().collect(),
            transitions: self.transitions.into_iter().collect(),
            entry,
            terminal,
            pause_points: self.pause_before.into_iter().collect(),
        })
    }
}

/// An outgoing edge as seen from outside the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// A validated, immutable graph. Share it between executors with `Arc`.
pub struct StepGraph<S: StateSchema> {
    steps: AHashMap<String, Box<dyn StepHandler<S>>>,
    transitions: AHashMap<String, Transition<S>>,
    entry: String,
    terminal: String,
    pause_points: AHashSet<String>,
}

impl<S: StateSchema> StepGraph<S> {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn contains_step(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn is_pause_point(&self, name: &str) -> bool {
        self.pause_points.contains(name)
    }

    pub fn step_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.steps.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn edges(&self) -> Vec<EdgeView> {
        let mut edges = Vec::new();
        for (from, transition) in &self.transitions {
            match transition {
                Transition::Fixed(to) => edges.push(EdgeView {
                    from: from.clone(),
                    to: to.clone(),
                    label: None,
                }),
                Transition::Conditional { routes, .. } => {
                    edges.extend(routes.iter().map(|(label, to)| EdgeView {
                        from: from.clone(),
                        to: to.clone(),
                        label: Some(label.clone()),
                    }))
                }
            }
        }
        edges.sort_by(|a, b| (&a.from, &a.label, &a.to).cmp(&(&b.from, &b.label, &b.to)));
        edges
    }

    pub(crate) fn handler(&self, name: &str) -> Option<&dyn StepHandler<S>> {
        self.steps.get(name).map(|handler| handler.as_ref())
    }

    /// Resolves the step after `current` against the already-updated state.
    pub(crate) fn next_step(&self, current: &str, state: &GraphState<S>) -> Result<String, GraphError> {
        match self.transitions.get(current) {
            Some(Transition::Fixed(to)) => Ok(to.clone()),
            Some(Transition::Conditional { router, routes }) => {
                let label = router.route(state);
                routes
                    .get(&label)
                    .cloned()
                    .ok_or_else(|| GraphError::Routing {
                        step: current.to_string(),
                        label,
                    })
            }
            None => Err(GraphError::Build(BuildError::DeadEnd {
                step: current.to_string(),
            })),
        }
    }
}
