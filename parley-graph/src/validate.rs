use std::collections::HashMap;

use ahash::AHashSet;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use parley_core::{StateSchema, StepHandler};

use crate::graph::Transition;
use crate::BuildError;

pub(crate) fn validate<S: StateSchema>(
    steps: &[(String, Box<dyn StepHandler<S>>)],
    transitions: &[(String, Transition<S>)],
    entry: Option<&str>,
    terminal: Option<&str>,
    pause_before: &[String],
) -> Result<(), BuildError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for (name, _) in steps {
        if index.contains_key(name.as_str()) {
            return Err(BuildError::DuplicateStep { step: name.clone() });
        }
        index.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    let entry = entry.ok_or(BuildError::MissingEntry)?;
    let terminal = terminal.ok_or(BuildError::MissingTerminal)?;
    let entry_ix = lookup(&index, entry, "entry")?;
    let terminal_ix = lookup(&index, terminal, "terminal")?;

    let mut with_edge: AHashSet<&str> = AHashSet::new();
    for (from, transition) in transitions {
        let from_ix = lookup(&index, from, from)?;
        if !with_edge.insert(from.as_str()) {
            return Err(BuildError::ConflictingEdges { step: from.clone() });
        }
        if from == terminal {
            return Err(BuildError::TerminalHasEdge { step: from.clone() });
        }
        match transition {
            Transition::Fixed(to) => {
                let to_ix = lookup(&index, to, from)?;
                graph.add_edge(from_ix, to_ix, ());
            }
            Transition::Conditional { router, routes } => {
                if routes.is_empty() {
                    return Err(BuildError::EmptyRouteMap { step: from.clone() });
                }
                for label in router.labels() {
                    if !routes.contains_key(&label) {
                        return Err(BuildError::UnmappedLabel {
                            step: from.clone(),
                            label,
                        });
                    }
                }
                for to in routes.values() {
                    let to_ix = lookup(&index, to, from)?;
                    graph.add_edge(from_ix, to_ix, ());
                }
            }
        }
    }

    for (name, _) in steps {
        if name != terminal && !with_edge.contains(name.as_str()) {
            return Err(BuildError::DeadEnd { step: name.clone() });
        }
    }

    if !has_path_connecting(&graph, entry_ix, terminal_ix, None) {
        return Err(BuildError::UnreachableTerminal {
            entry: entry.to_string(),
            terminal: terminal.to_string(),
        });
    }

    for step in pause_before {
        let step_ix = lookup(&index, step, "pause point")?;
        if !has_path_connecting(&graph, entry_ix, step_ix, None) {
            return Err(BuildError::UnreachablePausePoint { step: step.clone() });
        }
        if !has_path_connecting(&graph, step_ix, terminal_ix, None) {
            return Err(BuildError::PausePointWithoutExit { step: step.clone() });
        }
    }

    Ok(())
}

fn lookup(
    index: &HashMap<&str, NodeIndex>,
    step: &str,
    referenced_by: &str,
) -> Result<NodeIndex, BuildError> {
    index
        .get(step)
        .copied()
        .ok_or_else(|| BuildError::UnknownStep {
            step: step.to_string(),
            referenced_by: referenced_by.to_string(),
        })
}
