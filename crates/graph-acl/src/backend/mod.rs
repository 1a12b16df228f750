mod oxigraph_backend;

use oxigraph::{
    model::{NamedNode, NamedOrBlankNode, Quad, Term},
    sparql::{QuerySolution, Variable},
};
pub use oxigraph_backend::{OxigraphConnection, OxigraphStore};

use crate::{
    error::Result,
    types::{Dataset, GraphScope, StatementPattern},
};

/// Statements yielded by a store read.
pub type StatementIter<'a> = Box<dyn Iterator<Item = Result<Quad>> + 'a>;

/// Named graphs known to a store. Never yields the default graph.
pub type ContextIter<'a> = Box<dyn Iterator<Item = Result<NamedOrBlankNode>> + 'a>;

/// `(prefix, namespace)` pairs.
pub type NamespaceIter<'a> = Box<dyn Iterator<Item = Result<(String, String)>> + 'a>;

/// Solutions of a structured query.
pub type SolutionIter<'a> = Box<dyn Iterator<Item = Result<QuerySolution>> + 'a>;

/// A factory for connections to one statement store.
pub trait StatementStore {
    type Connection: StoreConnection;

    fn connection(&self) -> Result<Self::Connection>;
}

/// Connection to a statement store
///
/// A connection is used from one thread at a time. Reads borrow the connection
/// for as long as their iterator lives.
pub trait StoreConnection {
    /// Backend name for logging/metrics
    fn name(&self) -> &'static str;

    fn is_open(&self) -> bool;

    /// Close the connection. Closing an already closed connection is a no-op.
    fn close(&mut self) -> Result<()>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Statements matching `pattern` within `scope`
    fn get_statements(
        &self,
        pattern: &StatementPattern,
        include_inferred: bool,
        scope: &GraphScope,
    ) -> Result<StatementIter<'_>>;

    fn has_statement(
        &self,
        pattern: &StatementPattern,
        include_inferred: bool,
        scope: &GraphScope,
    ) -> Result<bool> {
        let mut statements = self.get_statements(pattern, include_inferred, scope)?;
        Ok(statements.next().transpose()?.is_some())
    }

    /// Add one statement to every graph in `scope`; `GraphScope::Any` adds to
    /// the default graph.
    fn add_statement(
        &mut self,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        object: &Term,
        scope: &GraphScope,
    ) -> Result<()>;

    /// Remove matching statements; `GraphScope::Any` removes from every graph.
    fn remove_statements(&mut self, pattern: &StatementPattern, scope: &GraphScope) -> Result<()>;

    /// Remove every statement in `scope`; `GraphScope::Any` empties the store.
    fn clear(&mut self, scope: &GraphScope) -> Result<()>;

    fn size(&self, scope: &GraphScope) -> Result<u64>;

    fn get_context_ids(&self) -> Result<ContextIter<'_>>;

    fn get_namespace(&self, prefix: &str) -> Result<Option<String>>;

    fn get_namespaces(&self) -> Result<NamespaceIter<'_>>;

    fn set_namespace(&mut self, prefix: &str, name: &str) -> Result<()>;

    fn remove_namespace(&mut self, prefix: &str) -> Result<()>;

    fn clear_namespaces(&mut self) -> Result<()>;

    /// Evaluate a SPARQL SELECT query.
    ///
    /// When `dataset` is given it replaces whatever dataset the query text
    /// declares. `bindings` are substituted before evaluation.
    fn evaluate(
        &self,
        query: &str,
        dataset: Option<&Dataset>,
        bindings: &[(Variable, Term)],
        include_inferred: bool,
    ) -> Result<SolutionIter<'_>>;
}
