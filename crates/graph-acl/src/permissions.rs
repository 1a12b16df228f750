//! Live permission sets shared between a store and its connections.

use std::sync::Arc;

use dashmap::DashSet;
use oxigraph::model::{GraphName, NamedOrBlankNode};

use crate::types::named_graph;

/// A set of named graphs a caller may access.
///
/// The set is owned by the store and shared with every connection through an
/// `Arc`. Connections consult it on every check, so changes take effect for
/// in-flight reads as well. The default graph can never be a member.
#[derive(Debug, Default)]
pub struct PermissionSet {
    graphs: DashSet<NamedOrBlankNode>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready to be passed to a store.
    pub fn shared<I, G>(graphs: I) -> Arc<Self>
    where
        I: IntoIterator<Item = G>,
        G: Into<NamedOrBlankNode>,
    {
        Arc::new(
            graphs
                .into_iter()
                .map(|graph| -> NamedOrBlankNode { graph.into() })
                .collect(),
        )
    }

    /// Returns `true` if the graph was not already present.
    pub fn insert(&self, graph: impl Into<NamedOrBlankNode>) -> bool {
        self.graphs.insert(graph.into())
    }

    /// Returns `true` if the graph was present.
    pub fn remove(&self, graph: &NamedOrBlankNode) -> bool {
        self.graphs.remove(graph).is_some()
    }

    pub fn contains(&self, graph: &NamedOrBlankNode) -> bool {
        self.graphs.contains(graph)
    }

    /// Membership test for a statement's graph; always `false` for the
    /// default graph.
    pub fn permits(&self, graph: &GraphName) -> bool {
        named_graph(graph).is_some_and(|graph| self.contains(&graph))
    }

    pub fn clear(&self) {
        self.graphs.clear();
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Point-in-time copy of the members, in no particular order.
    pub fn snapshot(&self) -> Vec<NamedOrBlankNode> {
        self.graphs.iter().map(|graph| graph.key().clone()).collect()
    }
}

impl FromIterator<NamedOrBlankNode> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = NamedOrBlankNode>>(iter: T) -> Self {
        Self {
            graphs: iter.into_iter().collect(),
        }
    }
}
