use async_trait::async_trait;
use relaygraph::node::{Node, NodeContext, NodeError};
use relaygraph::state::{State, StatePartial};
use serde_json::json;

/// Appends fixed items to `transcript` and adds one to `calls`.
#[derive(Debug, Clone)]
pub struct AppendNode {
    pub items: Vec<&'static str>,
}

impl AppendNode {
    pub fn new(items: Vec<&'static str>) -> Self {
        Self { items }
    }

    pub fn one(item: &'static str) -> Self {
        Self::new(vec![item])
    }
}

#[async_trait]
impl Node for AppendNode {
    async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
        Ok(StatePartial::new()
            .with_field("transcript", json!(self.items))
            .with_field("calls", json!(1)))
    }

    fn writes(&self) -> Vec<String> {
        vec!["transcript".into(), "calls".into()]
    }
}

/// Produces an empty partial.
#[derive(Debug, Clone)]
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
        Ok(StatePartial::default())
    }
}

/// Fails as if its external call errored.
#[derive(Debug, Clone)]
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
        Err(NodeError::Provider {
            provider: "completion",
            message: "upstream unavailable".into(),
        })
    }
}

/// Declares a write to a field no schema declares.
#[derive(Debug, Clone)]
pub struct UndeclaredWriter;

#[async_trait]
impl Node for UndeclaredWriter {
    async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
        Ok(StatePartial::new().with_field("mystery", json!(1)))
    }

    fn writes(&self) -> Vec<String> {
        vec!["mystery".into()]
    }
}

/// Writes an undeclared field without advertising it, so the mistake can
/// only surface at merge time.
#[derive(Debug, Clone)]
pub struct SilentUndeclaredWriter;

#[async_trait]
impl Node for SilentUndeclaredWriter {
    async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
        Ok(StatePartial::new().with_field("mystery", json!(1)))
    }
}
