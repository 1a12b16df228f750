//! Graph selection and pattern types shared by stores and the access layer.

use oxigraph::model::{GraphName, NamedNode, NamedOrBlankNode, Term};

/// A graph list that is guaranteed to hold at least one entry.
///
/// Stores treat an absent restriction as "every graph", so a derived graph
/// list must never be forwarded when it is empty. Construction goes through
/// [`NonEmptyGraphs::new`], which refuses empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyGraphs(Vec<GraphName>);

impl NonEmptyGraphs {
    /// Returns `None` when `graphs` is empty.
    pub fn new(graphs: Vec<GraphName>) -> Option<Self> {
        if graphs.is_empty() {
            None
        } else {
            Some(Self(graphs))
        }
    }

    pub fn one(graph: impl Into<GraphName>) -> Self {
        Self(vec![graph.into()])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[GraphName] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a NonEmptyGraphs {
    type Item = &'a GraphName;
    type IntoIter = std::slice::Iter<'a, GraphName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Graph argument of store operations.
///
/// `Any` is the wildcard form (no graph given by the caller). Its meaning is
/// operation specific: for reads and removals on a plain store it covers every
/// graph, for `add_statement` it targets the default graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphScope {
    Any,
    Graphs(NonEmptyGraphs),
}

impl GraphScope {
    pub fn one(graph: impl Into<GraphName>) -> Self {
        Self::Graphs(NonEmptyGraphs::one(graph))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Caller-facing conversion: an empty list is the wildcard form.
impl From<Vec<GraphName>> for GraphScope {
    fn from(graphs: Vec<GraphName>) -> Self {
        NonEmptyGraphs::new(graphs).map_or(Self::Any, Self::Graphs)
    }
}

impl From<NonEmptyGraphs> for GraphScope {
    fn from(graphs: NonEmptyGraphs) -> Self {
        Self::Graphs(graphs)
    }
}

/// Subject/predicate/object pattern; `None` positions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPattern {
    pub subject: Option<NamedOrBlankNode>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
}

impl StatementPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<NamedOrBlankNode>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }
}

/// Graphs a structured query is evaluated against.
///
/// Empty lists mean "no graphs". A store must never read them as "all graphs".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub default_graphs: Vec<GraphName>,
    pub named_graphs: Vec<NamedOrBlankNode>,
}

/// Named graph behind a graph name, `None` for the default graph.
pub(crate) fn named_graph(graph: &GraphName) -> Option<NamedOrBlankNode> {
    match graph {
        GraphName::NamedNode(node) => Some(NamedOrBlankNode::NamedNode(node.clone())),
        GraphName::BlankNode(node) => Some(NamedOrBlankNode::BlankNode(node.clone())),
        GraphName::DefaultGraph => None,
    }
}

pub(crate) fn graph_name(graph: &NamedOrBlankNode) -> GraphName {
    match graph {
        NamedOrBlankNode::NamedNode(node) => GraphName::NamedNode(node.clone()),
        NamedOrBlankNode::BlankNode(node) => GraphName::BlankNode(node.clone()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn empty_list_is_not_a_restriction() {
        assert!(NonEmptyGraphs::new(Vec::new()).is_none());
        assert!(GraphScope::from(Vec::new()).is_any());
        assert!(!GraphScope::one(GraphName::DefaultGraph).is_any());
    }

    #[test]
    fn non_empty_list_keeps_request_order() {
        let a = NamedNode::new("http://example.org/a").unwrap();
        let b = NamedNode::new("http://example.org/b").unwrap();
        let scope = GraphScope::from(vec![b.clone().into(), GraphName::DefaultGraph, a.clone().into()]);

        let GraphScope::Graphs(graphs) = scope else {
            panic!("expected explicit graphs");
        };
        assert_eq!(graphs.len(), 3);
        assert_eq!(
            graphs.as_slice(),
            &[b.into(), GraphName::DefaultGraph, a.into()]
        );
    }

    #[test]
    fn default_graph_has_no_named_graph() {
        let g = NamedNode::new("http://example.org/g").unwrap();
        assert_eq!(named_graph(&GraphName::DefaultGraph), None);
        let named = named_graph(&GraphName::from(g.clone())).unwrap();
        assert_eq!(graph_name(&named), GraphName::from(g));
    }
}
