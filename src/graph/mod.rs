//! Graph definition and compilation.
//!
//! [`GraphBuilder`] accumulates named nodes and directed edges against a
//! declared state schema; [`GraphBuilder::compile`] validates the structure
//! and produces an immutable [`Schedule`] the executor can run.
//!
//! # Quick start
//!
//! ```
//! use async_trait::async_trait;
//! use relaygraph::graph::GraphBuilder;
//! use relaygraph::node::{Node, NodeContext, NodeError};
//! use relaygraph::reducers::MergePolicy;
//! use relaygraph::state::{State, StatePartial, StateSchema};
//! use serde_json::json;
//!
//! struct Tick;
//!
//! #[async_trait]
//! impl Node for Tick {
//!     async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
//!         Ok(StatePartial::new().with_field("calls", json!(1)))
//!     }
//! }
//!
//! let schema = StateSchema::builder()
//!     .scalar("calls", MergePolicy::Sum)
//!     .unwrap()
//!     .build();
//!
//! let schedule = GraphBuilder::new(schema)
//!     .add_node("first", Tick).unwrap()
//!     .add_node("second", Tick).unwrap()
//!     .add_edge("first", "second").unwrap()
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(schedule.order(), ["first".to_string(), "second".to_string()]);
//! assert_eq!(schedule.entries(), ["first".to_string()]);
//! assert_eq!(schedule.terminals(), ["second".to_string()]);
//! ```

mod builder;
mod compile;

pub use builder::{GraphBuilder, GraphError};
pub use compile::{CompileError, Schedule};
