//! Name-to-node registry.
//!
//! Nodes are referenced by name everywhere outside this component, never by
//! direct reference, so a graph can be inspected without invoking any node.
//! Registration order is preserved; the compiler uses it to break topological
//! ties deterministically.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::node::Node;

/// Errors raised by registry operations.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    /// A node with this name is already registered.
    #[error("duplicate node name `{name}`")]
    #[diagnostic(
        code(relaygraph::registry::duplicate_node),
        help("Node names identify nodes within a graph and must be unique.")
    )]
    DuplicateNode { name: String },

    /// No node with this name is registered.
    #[error("unknown node name `{name}`")]
    #[diagnostic(code(relaygraph::registry::unknown_node))]
    UnknownNode { name: String },
}

/// Maps unique names to node implementations.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: FxHashMap<String, Arc<dyn Node>>,
    order: Vec<String>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        node: impl Node + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(RegistryError::DuplicateNode { name });
        }
        self.order.push(name.clone());
        self.nodes.insert(name, Arc::new(node));
        Ok(())
    }

    /// Resolves a name to its node.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Node>, RegistryError> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownNode {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn into_parts(self) -> (FxHashMap<String, Arc<dyn Node>>, Vec<String>) {
        (self.nodes, self.order)
    }
}
