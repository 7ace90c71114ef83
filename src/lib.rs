//! # Relaygraph: graph compiler and deterministic sequential executor
//!
//! Relaygraph builds and executes a directed graph of stateful processing
//! nodes that collaboratively transform a shared, append-friendly state
//! object. Each node consumes the current state, produces a partial update,
//! and the engine merges that update using a per-field merge policy before
//! advancing to successor nodes.
//!
//! ## Core concepts
//!
//! - **State**: declared fields with explicit merge policies
//!   (append / replace / sum / max), owned by the executor for one run
//! - **Nodes**: async units of work producing [`state::StatePartial`] deltas
//! - **Graph**: named nodes plus directed precedence edges
//! - **Schedule**: the compiled, immutable, validated execution order
//! - **Executor**: strictly sequential driver applying one merge per node
//!
//! ## Quick start
//!
//! ```
//! use async_trait::async_trait;
//! use relaygraph::executor::Executor;
//! use relaygraph::graph::GraphBuilder;
//! use relaygraph::node::{Node, NodeContext, NodeError};
//! use relaygraph::reducers::MergePolicy;
//! use relaygraph::state::{State, StatePartial, StateSchema};
//! use serde_json::json;
//!
//! struct AppendNode(&'static str);
//!
//! #[async_trait]
//! impl Node for AppendNode {
//!     async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
//!         Ok(StatePartial::new()
//!             .with_field("transcript", json!([self.0]))
//!             .with_field("calls", json!(1)))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = StateSchema::builder()
//!     .accumulating("transcript")
//!     .scalar("calls", MergePolicy::Sum)?
//!     .build();
//!
//! let schedule = GraphBuilder::new(schema)
//!     .add_node("a", AppendNode("a1"))?
//!     .add_node("b", AppendNode("b1"))?
//!     .add_edge("a", "b")?
//!     .compile()?;
//!
//! let executor = Executor::new(schedule);
//! let final_state = executor.run(executor.schedule().initial_state()).await?;
//!
//! assert_eq!(final_state.get("transcript"), Some(&json!(["a1", "b1"])));
//! assert_eq!(final_state.get("calls"), Some(&json!(2)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module guide
//!
//! - [`state`] - shared-state schema, merge application, partial updates
//! - [`reducers`] - per-field merge policies
//! - [`node`] - node trait and execution primitives
//! - [`registry`] - name-to-node registry
//! - [`graph`] - graph definition and compilation into a schedule
//! - [`executor`] - sequential execution engine
//! - [`message`] - role-tagged transcript records
//! - [`clients`] - completion and search service boundaries
//! - [`panel`] - specialist opinion chains built on the engine
//! - [`telemetry`] - tracing setup

pub mod clients;
pub mod executor;
pub mod graph;
pub mod message;
pub mod node;
pub mod panel;
pub mod reducers;
pub mod registry;
pub mod state;
pub mod telemetry;
