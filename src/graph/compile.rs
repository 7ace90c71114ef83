//! Compilation of a [`GraphBuilder`] into an executable [`Schedule`].
//!
//! Compilation computes node in-degrees, records entry nodes (in-degree
//! zero) and terminal nodes (out-degree zero), and produces a stable
//! topological order with ties broken by registration order. Cyclic or
//! terminal-less graphs are rejected here, never at run time.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use super::builder::GraphBuilder;
use crate::node::Node;
use crate::state::{State, StateSchema};

/// Errors raised during compilation.
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    /// The builder holds no nodes.
    #[error("cannot compile an empty graph")]
    #[diagnostic(
        code(relaygraph::graph::empty),
        help("Register at least one node before compiling.")
    )]
    EmptyGraph,

    /// The topological sort could not place these nodes.
    #[error("graph contains a cycle through: {}", nodes.join(", "))]
    #[diagnostic(
        code(relaygraph::graph::cycle),
        help("Remove at least one edge so every node is reachable from an entry node.")
    )]
    Cycle { nodes: Vec<String> },

    /// No node has out-degree zero, so no execution can ever complete.
    #[error("graph has no terminal node")]
    #[diagnostic(
        code(relaygraph::graph::no_terminal),
        help("At least one node must have no outgoing edge.")
    )]
    NoTerminal,

    /// A node declares a write to a field the schema never declared.
    #[error("node `{node}` writes undeclared state field `{field}`")]
    #[diagnostic(
        code(relaygraph::graph::undeclared_field),
        help("Declare the field in the state schema before compiling the graph.")
    )]
    UndeclaredField { node: String, field: String },
}

/// The compiled, immutable execution plan.
///
/// Holds the execution order, the detected entry and terminal nodes, the
/// bound node implementations, and the state schema. A `Schedule` is
/// read-only and cheap to clone; it can back any number of concurrent runs,
/// each of which owns its own [`State`].
#[derive(Clone)]
pub struct Schedule {
    order: Vec<String>,
    entries: Vec<String>,
    terminals: Vec<String>,
    nodes: FxHashMap<String, Arc<dyn Node>>,
    schema: Arc<StateSchema>,
}

impl Schedule {
    /// Node names in execution order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Entry nodes (in-degree zero), in registration order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Terminal nodes (out-degree zero), in registration order.
    #[must_use]
    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    /// Resolves a scheduled node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(name).cloned()
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// A fresh state with every schema field at its policy default.
    #[must_use]
    pub fn initial_state(&self) -> State {
        State::new(Arc::clone(&self.schema))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for Schedule {
    /// Node implementations are opaque trait objects, so only the structural
    /// fields are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("order", &self.order)
            .field("entries", &self.entries)
            .field("terminals", &self.terminals)
            .finish_non_exhaustive()
    }
}

impl GraphBuilder {
    /// Compiles the accumulated nodes and edges into a [`Schedule`].
    ///
    /// Deterministic: compiling the same builder twice yields an identical
    /// order. The topological sort follows each fan-out branch to completion
    /// before moving to the next, choosing among branches (and breaking all
    /// remaining ties) by registration order, so merges are never interleaved
    /// mid-branch regardless of how the nodes were registered.
    #[instrument(skip(self), err)]
    pub fn compile(self) -> Result<Schedule, CompileError> {
        if self.registry.is_empty() {
            return Err(CompileError::EmptyGraph);
        }

        let schema = Arc::clone(&self.schema);
        let edges = self.edges;
        let (nodes, names) = self.registry.into_parts();

        for name in &names {
            let node = nodes.get(name).expect("registered name resolves");
            for field in node.writes() {
                if !schema.contains(&field) {
                    return Err(CompileError::UndeclaredField {
                        node: name.clone(),
                        field,
                    });
                }
            }
        }

        let index_of: FxHashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; names.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
        for (source, targets) in &edges {
            let s = index_of[source.as_str()];
            for target in targets {
                let t = index_of[target.as_str()];
                successors[s].push(t);
                in_degree[t] += 1;
            }
        }

        let terminals: Vec<String> = names
            .iter()
            .filter(|n| edges.get(n.as_str()).is_none_or(Vec::is_empty))
            .cloned()
            .collect();
        if terminals.is_empty() {
            return Err(CompileError::NoTerminal);
        }

        let entries: Vec<String> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] == 0)
            .map(|(_, n)| n.clone())
            .collect();

        // Kahn's algorithm with a branch-following pick: after placing a
        // node, a successor it just unblocked is preferred over every other
        // ready node, so each branch runs to completion before execution
        // moves to the next one. Remaining ties resolve to the
        // earliest-registered ready node.
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(names.len());
        let mut preferred: Option<usize> = None;
        while let Some(next) = preferred
            .filter(|i| ready.contains(i))
            .or_else(|| ready.first().copied())
        {
            ready.remove(&next);
            order.push(names[next].clone());
            let mut unblocked: Option<usize> = None;
            for &succ in &successors[next] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert(succ);
                    if unblocked.is_none_or(|u| succ < u) {
                        unblocked = Some(succ);
                    }
                }
            }
            preferred = unblocked;
        }

        if order.len() < names.len() {
            let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
            let trapped = names
                .iter()
                .filter(|n| !placed.contains(n.as_str()))
                .cloned()
                .collect();
            return Err(CompileError::Cycle { nodes: trapped });
        }

        tracing::debug!(
            nodes = order.len(),
            entries = entries.len(),
            terminals = terminals.len(),
            "graph compiled"
        );

        Ok(Schedule {
            order,
            entries,
            terminals,
            nodes,
            schema,
        })
    }
}
