//! Fluent builder for graphs of named nodes and directed edges.

use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::node::Node;
use crate::registry::{NodeRegistry, RegistryError};
use crate::state::StateSchema;

/// Errors raised while assembling a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Node registration or lookup failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    /// The exact same edge was added twice.
    #[error("duplicate edge `{from}` -> `{to}`")]
    #[diagnostic(
        code(relaygraph::graph::duplicate_edge),
        help("Each precedence constraint may be declared once.")
    )]
    DuplicateEdge { from: String, to: String },
}

/// Accumulates nodes and edges before compilation.
///
/// The builder is pure accumulation: endpoints are checked against the
/// registry as edges arrive, but structural validation (cycles, entry and
/// terminal detection) happens in [`compile`](Self::compile).
pub struct GraphBuilder {
    pub(crate) registry: NodeRegistry,
    pub(crate) edges: FxHashMap<String, Vec<String>>,
    pub(crate) schema: Arc<StateSchema>,
}

impl GraphBuilder {
    /// Creates a builder over the given state schema.
    #[must_use]
    pub fn new(schema: StateSchema) -> Self {
        Self {
            registry: NodeRegistry::new(),
            edges: FxHashMap::default(),
            schema: Arc::new(schema),
        }
    }

    /// Registers a node under a unique name.
    ///
    /// Fails with [`RegistryError::DuplicateNode`] if the name is taken.
    pub fn add_node(
        mut self,
        name: impl Into<String>,
        node: impl Node + 'static,
    ) -> Result<Self, GraphError> {
        self.registry.register(name, node)?;
        Ok(self)
    }

    /// Adds a directed edge: `target` becomes eligible to run only after
    /// `source` completes.
    ///
    /// Fails with [`RegistryError::UnknownNode`] if either endpoint is
    /// unregistered and with [`GraphError::DuplicateEdge`] on an exact repeat.
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let source = source.into();
        let target = target.into();
        for endpoint in [&source, &target] {
            if !self.registry.contains(endpoint) {
                return Err(RegistryError::UnknownNode {
                    name: endpoint.clone(),
                }
                .into());
            }
        }
        let targets = self.edges.entry(source.clone()).or_default();
        if targets.contains(&target) {
            return Err(GraphError::DuplicateEdge {
                from: source,
                to: target,
            });
        }
        targets.push(target);
        Ok(self)
    }

    /// Registered node names in registration order.
    #[must_use]
    pub fn node_names(&self) -> &[String] {
        self.registry.names()
    }

    /// Number of declared edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for GraphBuilder {
    /// Node implementations are opaque trait objects, so only names and
    /// edges are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("nodes", &self.registry.names())
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}
