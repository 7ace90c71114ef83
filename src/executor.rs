//! Sequential execution of a compiled schedule.
//!
//! The executor makes a single pass over the schedule's order. For each node
//! it invokes the bound implementation with the current state, merges the
//! returned partial through the state model, and advances. Execution is
//! strictly sequential even when the graph would permit independent branches;
//! the merge-ordering guarantee depends on it.

use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::graph::Schedule;
use crate::node::{NodeContext, NodeError};
use crate::state::{State, StateError};

/// Lifecycle of a single execution.
///
/// `Running` is entered once; `Completed` returns the final state and
/// `Failed` surfaces the originating error plus the name of the node that
/// raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Errors that terminate a run.
///
/// A failed run discards its state merges; the schedule itself is not
/// corrupted and a fresh run with the same or different initial state remains
/// valid.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    /// A node's body (typically its external completion or search call)
    /// failed.
    #[error("node `{node}` failed")]
    #[diagnostic(
        code(relaygraph::executor::node),
        help("The executor does not retry; retry policy belongs inside the node's own service binding.")
    )]
    Node {
        node: String,
        #[source]
        source: NodeError,
    },

    /// Merging a node's partial update was rejected by the state model.
    #[error("merging output of node `{node}` failed")]
    #[diagnostic(code(relaygraph::executor::merge))]
    Merge {
        node: String,
        #[source]
        source: StateError,
    },
}

impl RunError {
    /// Name of the node whose step terminated the run.
    #[must_use]
    pub fn node_name(&self) -> &str {
        match self {
            RunError::Node { node, .. } | RunError::Merge { node, .. } => node,
        }
    }
}

/// Drives a [`Schedule`] against an initial state.
///
/// The schedule is read-only; an executor can be cloned and shared across
/// tasks, and concurrent `run` calls are independent because each owns its
/// state outright.
///
/// # Examples
///
/// ```no_run
/// use relaygraph::executor::Executor;
/// # async fn demo(schedule: relaygraph::graph::Schedule) -> Result<(), relaygraph::executor::RunError> {
/// let executor = Executor::new(schedule);
/// let final_state = executor.run(executor.schedule().initial_state()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Executor {
    schedule: Schedule,
}

impl Executor {
    #[must_use]
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Runs the compiled order to completion and returns the final state.
    ///
    /// Halts on the first node failure; no auto-skip, no auto-retry. State
    /// merges performed before the failure are discarded along with the
    /// returned error.
    #[instrument(skip(self, initial_state), err)]
    pub async fn run(&self, initial_state: State) -> Result<State, RunError> {
        let mut state = initial_state;
        tracing::debug!(status = ?RunStatus::Running, nodes = self.schedule.len(), "run started");

        for (step, name) in self.schedule.order().iter().enumerate() {
            let node = self
                .schedule
                .node(name)
                .expect("compiled order only names registered nodes");
            let ctx = NodeContext {
                node_name: name.clone(),
                step: step as u64,
            };

            tracing::debug!(node = %name, step, "executing node");
            let partial = match node.run(&state, ctx).await {
                Ok(partial) => partial,
                Err(source) => {
                    tracing::warn!(status = ?RunStatus::Failed, node = %name, step, "node failed");
                    return Err(RunError::Node {
                        node: name.clone(),
                        source,
                    });
                }
            };

            if let Err(source) = state.merge(&partial) {
                tracing::warn!(status = ?RunStatus::Failed, node = %name, step, "merge rejected");
                return Err(RunError::Merge {
                    node: name.clone(),
                    source,
                });
            }
        }

        tracing::debug!(status = ?RunStatus::Completed, "run complete");
        Ok(state)
    }
}
