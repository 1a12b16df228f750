use std::{collections::HashSet, sync::Arc};

use oxigraph::{
    model::{GraphName, NamedNode, NamedOrBlankNode, Term},
    sparql::Variable,
};

use crate::{
    backend::{ContextIter, NamespaceIter, SolutionIter, StatementIter, StoreConnection},
    config::{ALLOW_WILDCARD_CLEAR, ALLOW_WILDCARD_SIZE, AccessPolicy},
    error::Result,
    filter::{ReadableContexts, ReadableStatements},
    metrics,
    permissions::PermissionSet,
    types::{Dataset, GraphScope, NonEmptyGraphs, StatementPattern, graph_name, named_graph},
};

/// Connection decorator restricting reads and writes to permitted graphs
///
/// Every operation of the wrapped connection is either passed through,
/// narrowed to the permitted graphs, or filtered. Denials are silent: reads
/// return nothing and writes do nothing, so callers cannot tell a denied graph
/// from an empty one. Denials are reported through `tracing` at debug level
/// and the `graph_acl_access_denied_total` counter.
///
/// The permission sets are consulted live on every operation.
pub struct AccessControlledConnection<C> {
    inner: C,
    readable: Arc<PermissionSet>,
    writable: Arc<PermissionSet>,
    policy: AccessPolicy,
}

impl<C: StoreConnection> AccessControlledConnection<C> {
    /// Wrap `inner`.
    ///
    /// A default write graph missing from `writable` is dropped here. This is
    /// the only time it is validated.
    pub fn new(
        inner: C,
        readable: Arc<PermissionSet>,
        writable: Arc<PermissionSet>,
        mut policy: AccessPolicy,
    ) -> Self {
        if let Some(graph) = &policy.default_write_graph
            && !writable.contains(graph)
        {
            tracing::warn!(
                graph = %graph,
                "Default write graph is not writable; writes without a graph will be ignored"
            );
            metrics::record_default_write_graph_downgraded();
            policy.default_write_graph = None;
        }

        Self {
            inner,
            readable,
            writable,
            policy,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn readable(&self) -> &Arc<PermissionSet> {
        &self.readable
    }

    pub fn writable(&self) -> &Arc<PermissionSet> {
        &self.writable
    }

    /// The wrapped connection, bypassing every permission check
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn denied(&self, operation: &'static str, reason: &'static str, graph: Option<&GraphName>) {
        match graph {
            Some(graph) => tracing::debug!(operation, reason, graph = %graph, "Access denied"),
            None => tracing::debug!(operation, reason, "Access denied"),
        }
        metrics::record_access_denied(operation, reason);
    }

    /// Requested graphs the caller may write, in request order.
    fn writable_graphs<'g>(
        &self,
        operation: &'static str,
        graphs: &'g NonEmptyGraphs,
    ) -> Vec<&'g GraphName> {
        graphs
            .iter()
            .filter(|graph| {
                let permitted = self.writable.permits(graph);
                if !permitted {
                    self.denied(operation, "not_writable", Some(graph));
                }
                permitted
            })
            .collect()
    }

    /// Remove matches from every writable graph that holds one.
    ///
    /// The store reads an unrestricted remove as "every graph", so the graphs
    /// are resolved here first and the store only ever sees an explicit,
    /// non-empty list.
    fn remove_from_writable_graphs(&mut self, pattern: &StatementPattern) -> Result<()> {
        let mut matched = Vec::new();
        let mut seen = HashSet::new();
        for statement in self.inner.get_statements(pattern, false, &GraphScope::Any)? {
            if let Some(graph) = named_graph(&statement?.graph_name)
                && seen.insert(graph.clone())
            {
                matched.push(graph);
            }
        }

        let to_remove: Vec<GraphName> = matched
            .iter()
            .filter(|graph| self.writable.contains(graph))
            .map(graph_name)
            .collect();
        metrics::record_wildcard_remove(matched.len(), to_remove.len());

        match NonEmptyGraphs::new(to_remove) {
            Some(graphs) => {
                tracing::debug!(
                    matched = matched.len(),
                    removing = graphs.len(),
                    "Removing statements from writable graphs"
                );
                self.inner
                    .remove_statements(pattern, &GraphScope::Graphs(graphs))
            }
            None => {
                if !matched.is_empty() {
                    self.denied("remove_statements", "no_writable_match", None);
                }
                Ok(())
            }
        }
    }

    /// Dataset a structured query may see: the requested graphs that are
    /// readable, or every readable graph when nothing was requested.
    pub fn scoped_dataset(&self, requested: Option<&Dataset>) -> Dataset {
        match requested {
            Some(requested) => {
                let scoped = Dataset {
                    default_graphs: requested
                        .default_graphs
                        .iter()
                        .filter(|graph| self.readable.permits(graph))
                        .cloned()
                        .collect(),
                    named_graphs: requested
                        .named_graphs
                        .iter()
                        .filter(|graph| self.readable.contains(graph))
                        .cloned()
                        .collect(),
                };
                let dropped = requested.default_graphs.len() + requested.named_graphs.len()
                    - scoped.default_graphs.len()
                    - scoped.named_graphs.len();
                if dropped > 0 {
                    tracing::debug!(dropped, "Narrowed requested dataset to readable graphs");
                    metrics::record_access_denied("evaluate", "not_readable");
                }
                scoped
            }
            None => {
                let readable = self.readable.snapshot();
                Dataset {
                    default_graphs: readable.iter().map(graph_name).collect(),
                    named_graphs: readable,
                }
            }
        }
    }
}

impl<C: StoreConnection> StoreConnection for AccessControlledConnection<C> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()
    }

    fn get_statements(
        &self,
        pattern: &StatementPattern,
        include_inferred: bool,
        scope: &GraphScope,
    ) -> Result<StatementIter<'_>> {
        match scope {
            GraphScope::Any => {
                let source = self
                    .inner
                    .get_statements(pattern, include_inferred, &GraphScope::Any)?;
                Ok(Box::new(ReadableStatements::new(
                    source,
                    Arc::clone(&self.readable),
                    Arc::clone(&self.writable),
                    self.policy.hide_non_writable_contexts,
                )))
            }
            GraphScope::Graphs(graphs) => {
                // Explicit graphs never include inferred statements.
                let mut parts = Vec::with_capacity(graphs.len());
                for graph in graphs {
                    if self.readable.permits(graph) {
                        parts.push(self.inner.get_statements(
                            pattern,
                            false,
                            &GraphScope::one(graph.clone()),
                        )?);
                    } else {
                        self.denied("get_statements", "not_readable", Some(graph));
                    }
                }
                Ok(Box::new(parts.into_iter().flatten()))
            }
        }
    }

    fn add_statement(
        &mut self,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        object: &Term,
        scope: &GraphScope,
    ) -> Result<()> {
        match scope {
            GraphScope::Any => match &self.policy.default_write_graph {
                Some(graph) => {
                    let target = GraphScope::one(graph_name(graph));
                    self.inner.add_statement(subject, predicate, object, &target)
                }
                None => {
                    self.denied("add_statement", "no_default_write_graph", None);
                    Ok(())
                }
            },
            GraphScope::Graphs(graphs) => {
                for graph in self.writable_graphs("add_statement", graphs) {
                    self.inner.add_statement(
                        subject,
                        predicate,
                        object,
                        &GraphScope::one(graph.clone()),
                    )?;
                }
                Ok(())
            }
        }
    }

    fn remove_statements(&mut self, pattern: &StatementPattern, scope: &GraphScope) -> Result<()> {
        match scope {
            GraphScope::Any => self.remove_from_writable_graphs(pattern),
            GraphScope::Graphs(graphs) => {
                for graph in self.writable_graphs("remove_statements", graphs) {
                    self.inner
                        .remove_statements(pattern, &GraphScope::one(graph.clone()))?;
                }
                Ok(())
            }
        }
    }

    fn clear(&mut self, scope: &GraphScope) -> Result<()> {
        match scope {
            GraphScope::Any if ALLOW_WILDCARD_CLEAR => self.inner.clear(&GraphScope::Any),
            GraphScope::Any => match &self.policy.default_write_graph {
                Some(graph) if self.writable.contains(graph) => {
                    let target = GraphScope::one(graph_name(graph));
                    self.inner.clear(&target)
                }
                _ => {
                    self.denied("clear", "no_default_write_graph", None);
                    Ok(())
                }
            },
            GraphScope::Graphs(graphs) => {
                for graph in self.writable_graphs("clear", graphs) {
                    self.inner.clear(&GraphScope::one(graph.clone()))?;
                }
                Ok(())
            }
        }
    }

    fn size(&self, scope: &GraphScope) -> Result<u64> {
        match scope {
            GraphScope::Any if ALLOW_WILDCARD_SIZE => self.inner.size(&GraphScope::Any),
            GraphScope::Any => {
                self.denied("size", "wildcard_size", None);
                Ok(0)
            }
            GraphScope::Graphs(graphs) => {
                let mut total = 0;
                for graph in graphs {
                    if self.readable.permits(graph) {
                        total += self.inner.size(&GraphScope::one(graph.clone()))?;
                    } else {
                        self.denied("size", "not_readable", Some(graph));
                    }
                }
                Ok(total)
            }
        }
    }

    fn get_context_ids(&self) -> Result<ContextIter<'_>> {
        let source = self.inner.get_context_ids()?;
        Ok(Box::new(ReadableContexts::new(
            source,
            Arc::clone(&self.readable),
        )))
    }

    fn get_namespace(&self, prefix: &str) -> Result<Option<String>> {
        if !self.policy.namespaces_readable {
            self.denied("get_namespace", "namespaces_not_readable", None);
            return Ok(None);
        }
        self.inner.get_namespace(prefix)
    }

    fn get_namespaces(&self) -> Result<NamespaceIter<'_>> {
        if !self.policy.namespaces_readable {
            self.denied("get_namespaces", "namespaces_not_readable", None);
            return Ok(Box::new(std::iter::empty()));
        }
        self.inner.get_namespaces()
    }

    fn set_namespace(&mut self, prefix: &str, name: &str) -> Result<()> {
        if !self.policy.namespaces_writable {
            self.denied("set_namespace", "namespaces_not_writable", None);
            return Ok(());
        }
        self.inner.set_namespace(prefix, name)
    }

    fn remove_namespace(&mut self, prefix: &str) -> Result<()> {
        if !self.policy.namespaces_writable {
            self.denied("remove_namespace", "namespaces_not_writable", None);
            return Ok(());
        }
        self.inner.remove_namespace(prefix)
    }

    fn clear_namespaces(&mut self) -> Result<()> {
        if !self.policy.namespaces_writable {
            self.denied("clear_namespaces", "namespaces_not_writable", None);
            return Ok(());
        }
        self.inner.clear_namespaces()
    }

    fn evaluate(
        &self,
        query: &str,
        dataset: Option<&Dataset>,
        bindings: &[(Variable, Term)],
        include_inferred: bool,
    ) -> Result<SolutionIter<'_>> {
        let scoped = self.scoped_dataset(dataset);
        self.inner
            .evaluate(query, Some(&scoped), bindings, include_inferred)
    }
}
