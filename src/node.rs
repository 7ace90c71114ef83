//! Node execution primitives.
//!
//! A node is a named, pure transformation from the current [`State`] to a
//! [`StatePartial`]. Nodes never mutate shared state directly; the executor
//! merges their partial updates under the schema's per-field policies.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::state::{State, StatePartial};

/// Core trait for executable graph nodes.
///
/// Nodes should be stateless: any persistent effect must flow through the
/// shared state. A node body may perform blocking I/O (a completion or search
/// call); such calls occupy the single execution thread for their duration.
///
/// # Errors
///
/// Returning `Err` halts the current run; the executor surfaces the error
/// together with the node's name. Retry policy, if any, belongs inside the
/// node's own binding to its external service and must not double-append to
/// accumulating fields.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use relaygraph::node::{Node, NodeContext, NodeError};
/// use relaygraph::state::{State, StatePartial};
/// use serde_json::json;
///
/// struct CounterNode;
///
/// #[async_trait]
/// impl Node for CounterNode {
///     async fn run(&self, _state: &State, _ctx: NodeContext) -> Result<StatePartial, NodeError> {
///         Ok(StatePartial::new().with_field("calls", json!(1)))
///     }
///
///     fn writes(&self) -> Vec<String> {
///         vec!["calls".into()]
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against the current state.
    async fn run(&self, state: &State, ctx: NodeContext) -> Result<StatePartial, NodeError>;

    /// Fields this node's partial updates may reference.
    ///
    /// Declared writes are validated against the state schema at compile
    /// time, turning undeclared-field mistakes into build errors. Nodes that
    /// return an empty list opt out of the compile-time check; the merge path
    /// still rejects undeclared fields at run time.
    fn writes(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Execution context handed to a node for one invocation.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Registered name of the node being executed.
    pub node_name: String,
    /// Zero-based position of this node in the compiled order.
    pub step: u64,
}

/// Fatal errors raised by node execution.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(relaygraph::node::missing_input),
        help("Check that an upstream node produced the required field.")
    )]
    MissingInput { what: &'static str },

    /// External provider or service error (completion, search, ...).
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(relaygraph::node::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(relaygraph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(code(relaygraph::node::validation))]
    ValidationFailed(String),
}
