use std::{path::Path, sync::Arc, time::Instant};

use dashmap::DashMap;
use oxigraph::{
    model::{GraphName, GraphNameRef, NamedNode, NamedOrBlankNode, Quad, Term},
    sparql::{QueryResults, SparqlEvaluator, Variable},
    store::Store,
};

use super::{
    ContextIter, NamespaceIter, SolutionIter, StatementIter, StatementStore, StoreConnection,
};
use crate::{
    error::{Result, StoreError},
    metrics,
    types::{Dataset, GraphScope, StatementPattern, graph_name},
};

const BACKEND_NAME: &str = "oxigraph";

/// Statement store over an embedded Oxigraph database
///
/// Oxigraph has no prefix table, so namespaces are kept in a map beside the
/// database. Clones and every connection opened from them share that map.
#[derive(Clone)]
pub struct OxigraphStore {
    store: Store,
    namespaces: Arc<DashMap<String, String>>,
}

impl OxigraphStore {
    /// Statements persist under `path`. Namespaces start empty on every open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::with_store(Store::open(&path)?);
        tracing::info!(path = %path.as_ref().display(), "Statement store opened");
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let store = Self::with_store(Store::new()?);
        tracing::debug!("Statement store created in memory");
        Ok(store)
    }

    fn with_store(store: Store) -> Self {
        Self {
            store,
            namespaces: Arc::new(DashMap::new()),
        }
    }

    /// Raw database handle. Writes made here bypass connection transactions
    /// and access control alike.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl StatementStore for OxigraphStore {
    type Connection = OxigraphConnection;

    fn connection(&self) -> Result<OxigraphConnection> {
        Ok(OxigraphConnection {
            store: self.store.clone(),
            namespaces: Arc::clone(&self.namespaces),
            undo_log: None,
            open: true,
        })
    }
}

enum Change {
    Inserted(Quad),
    Removed(Quad),
}

/// Connection to an [`OxigraphStore`]
///
/// Writes are applied immediately. While a transaction is active every
/// effective change is logged so `rollback` can revert it.
pub struct OxigraphConnection {
    store: Store,
    namespaces: Arc<DashMap<String, String>>,
    undo_log: Option<Vec<Change>>,
    open: bool,
}

impl OxigraphConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::ConnectionClosed)
        }
    }

    fn observed<T>(&mut self, op: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        timed(op, || self.ensure_open().and_then(|()| f(self)))
    }

    /// Read-only counterpart of `observed`. Lazy iterators are timed up to
    /// the point they are handed out.
    fn read<'a, T>(&'a self, op: &str, f: impl FnOnce(&'a Self) -> Result<T>) -> Result<T> {
        timed(op, || self.ensure_open().and_then(|()| f(self)))
    }

    fn statements(&self, pattern: &StatementPattern, scope: &GraphScope) -> StatementIter<'_> {
        match scope {
            GraphScope::Any => Box::new(
                self.store
                    .quads_for_pattern(
                        pattern.subject.as_ref().map(|s| s.as_ref()),
                        pattern.predicate.as_ref().map(|p| p.as_ref()),
                        pattern.object.as_ref().map(|o| o.as_ref()),
                        None,
                    )
                    .map(|quad| quad.map_err(StoreError::from)),
            ),
            GraphScope::Graphs(graphs) => {
                let graphs = graphs.as_slice().to_vec();
                let pattern = pattern.clone();
                Box::new(graphs.into_iter().flat_map(move |graph| {
                    self.store
                        .quads_for_pattern(
                            pattern.subject.as_ref().map(|s| s.as_ref()),
                            pattern.predicate.as_ref().map(|p| p.as_ref()),
                            pattern.object.as_ref().map(|o| o.as_ref()),
                            Some(graph.as_ref()),
                        )
                        .map(|quad| quad.map_err(StoreError::from))
                }))
            }
        }
    }

    fn context_ids(&self) -> Result<ContextIter<'_>> {
        // Oxigraph keeps a graph name after its last statement is removed.
        let mut contexts = Vec::new();
        for graph in self.store.named_graphs() {
            let graph = graph?;
            if self.graph_has_statements(&graph)? {
                contexts.push(Ok(graph));
            }
        }
        Ok(Box::new(contexts.into_iter()))
    }

    fn sorted_namespaces(&self) -> NamespaceIter<'_> {
        let mut namespaces: Vec<(String, String)> = self
            .namespaces
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        namespaces.sort();
        Box::new(namespaces.into_iter().map(Ok))
    }

    fn matching(
        &self,
        pattern: &StatementPattern,
        graph: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>> {
        self.store
            .quads_for_pattern(
                pattern.subject.as_ref().map(|s| s.as_ref()),
                pattern.predicate.as_ref().map(|p| p.as_ref()),
                pattern.object.as_ref().map(|o| o.as_ref()),
                graph,
            )
            .map(|quad| quad.map_err(StoreError::from))
            .collect()
    }

    /// Returns whether the store changed. Only effective changes are logged.
    fn insert(&mut self, quad: Quad) -> Result<bool> {
        if self.store.contains(&quad)? {
            return Ok(false);
        }
        self.store.insert(&quad)?;
        if let Some(log) = self.undo_log.as_mut() {
            log.push(Change::Inserted(quad));
        }
        Ok(true)
    }

    fn remove(&mut self, quad: Quad) -> Result<bool> {
        if !self.store.contains(&quad)? {
            return Ok(false);
        }
        self.store.remove(&quad)?;
        if let Some(log) = self.undo_log.as_mut() {
            log.push(Change::Removed(quad));
        }
        Ok(true)
    }

    fn remove_all(&mut self, quads: Vec<Quad>) -> Result<usize> {
        let mut removed = 0;
        for quad in quads {
            if self.remove(quad)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn graph_len(&self, graph: GraphNameRef<'_>) -> Result<u64> {
        let mut count = 0u64;
        for quad in self.store.quads_for_pattern(None, None, None, Some(graph)) {
            quad?;
            count += 1;
        }
        Ok(count)
    }

    fn graph_has_statements(&self, graph: &NamedOrBlankNode) -> Result<bool> {
        let graph = graph_name(graph);
        let first = self
            .store
            .quads_for_pattern(None, None, None, Some(graph.as_ref()))
            .next()
            .transpose()?;
        Ok(first.is_some())
    }
}

impl StoreConnection for OxigraphConnection {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        if self.undo_log.is_some() {
            tracing::debug!("Rolling back active transaction on close");
            self.rollback()?;
        }
        self.open = false;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.undo_log.is_some() {
            return Err(StoreError::TransactionAlreadyActive);
        }
        self.undo_log = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let log = self.undo_log.take().ok_or(StoreError::NoActiveTransaction)?;
        tracing::trace!(changes = log.len(), "Committed transaction");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        let log = self.undo_log.take().ok_or(StoreError::NoActiveTransaction)?;
        let changes = log.len();
        for change in log.into_iter().rev() {
            match change {
                Change::Inserted(quad) => {
                    self.store.remove(&quad)?;
                }
                Change::Removed(quad) => {
                    self.store.insert(&quad)?;
                }
            }
        }
        tracing::debug!(changes, "Rolled back transaction");
        Ok(())
    }

    fn get_statements(
        &self,
        pattern: &StatementPattern,
        _include_inferred: bool,
        scope: &GraphScope,
    ) -> Result<StatementIter<'_>> {
        self.read("get_statements", |conn| Ok(conn.statements(pattern, scope)))
    }

    fn add_statement(
        &mut self,
        subject: &NamedOrBlankNode,
        predicate: &NamedNode,
        object: &Term,
        scope: &GraphScope,
    ) -> Result<()> {
        self.observed("add", |conn| {
            match scope {
                GraphScope::Any => {
                    conn.insert(Quad::new(
                        subject.clone(),
                        predicate.clone(),
                        object.clone(),
                        GraphName::DefaultGraph,
                    ))?;
                }
                GraphScope::Graphs(graphs) => {
                    for graph in graphs {
                        conn.insert(Quad::new(
                            subject.clone(),
                            predicate.clone(),
                            object.clone(),
                            graph.clone(),
                        ))?;
                    }
                }
            }
            Ok(())
        })
    }

    fn remove_statements(&mut self, pattern: &StatementPattern, scope: &GraphScope) -> Result<()> {
        self.observed("remove", |conn| {
            let quads = match scope {
                GraphScope::Any => conn.matching(pattern, None)?,
                GraphScope::Graphs(graphs) => {
                    let mut quads = Vec::new();
                    for graph in graphs {
                        quads.extend(conn.matching(pattern, Some(graph.as_ref()))?);
                    }
                    quads
                }
            };
            let removed = conn.remove_all(quads)?;
            tracing::trace!(removed, "Removed statements");
            Ok(())
        })
    }

    fn clear(&mut self, scope: &GraphScope) -> Result<()> {
        self.observed("clear", |conn| {
            let everything = StatementPattern::any();
            let quads = match scope {
                GraphScope::Any => conn.matching(&everything, None)?,
                GraphScope::Graphs(graphs) => {
                    let mut quads = Vec::new();
                    for graph in graphs {
                        quads.extend(conn.matching(&everything, Some(graph.as_ref()))?);
                    }
                    quads
                }
            };
            conn.remove_all(quads)?;
            Ok(())
        })
    }

    fn size(&self, scope: &GraphScope) -> Result<u64> {
        self.read("size", |conn| match scope {
            GraphScope::Any => Ok(conn.store.len()? as u64),
            GraphScope::Graphs(graphs) => {
                let mut total = 0;
                for graph in graphs {
                    total += conn.graph_len(graph.as_ref())?;
                }
                Ok(total)
            }
        })
    }

    fn get_context_ids(&self) -> Result<ContextIter<'_>> {
        self.read("get_context_ids", Self::context_ids)
    }

    fn get_namespace(&self, prefix: &str) -> Result<Option<String>> {
        self.read("get_namespace", |conn| {
            Ok(conn.namespaces.get(prefix).map(|entry| entry.value().clone()))
        })
    }

    fn get_namespaces(&self) -> Result<NamespaceIter<'_>> {
        self.read("get_namespaces", |conn| Ok(conn.sorted_namespaces()))
    }

    fn set_namespace(&mut self, prefix: &str, name: &str) -> Result<()> {
        self.observed("set_namespace", |conn| {
            conn.namespaces.insert(prefix.to_string(), name.to_string());
            Ok(())
        })
    }

    fn remove_namespace(&mut self, prefix: &str) -> Result<()> {
        self.observed("remove_namespace", |conn| {
            conn.namespaces.remove(prefix);
            Ok(())
        })
    }

    fn clear_namespaces(&mut self) -> Result<()> {
        self.observed("clear_namespaces", |conn| {
            conn.namespaces.clear();
            Ok(())
        })
    }

    fn evaluate(
        &self,
        query: &str,
        dataset: Option<&Dataset>,
        bindings: &[(Variable, Term)],
        _include_inferred: bool,
    ) -> Result<SolutionIter<'_>> {
        self.read("evaluate", |conn| conn.evaluate_select(query, dataset, bindings))
    }
}

impl OxigraphConnection {
    fn evaluate_select(
        &self,
        query: &str,
        dataset: Option<&Dataset>,
        bindings: &[(Variable, Term)],
    ) -> Result<SolutionIter<'_>> {
        let mut prepared = SparqlEvaluator::new().parse_query(query)?;

        if let Some(dataset) = dataset {
            let target = prepared.dataset_mut();
            target.set_default_graph(dataset.default_graphs.clone());
            target.set_available_named_graphs(dataset.named_graphs.clone());
        }

        for (variable, term) in bindings {
            prepared = prepared.substitute_variable(variable.clone(), term.clone());
        }

        match prepared.on_store(&self.store).execute()? {
            QueryResults::Solutions(solutions) => {
                Ok(Box::new(solutions.map(|solution| solution.map_err(StoreError::from))))
            }
            _ => Err(StoreError::InvalidQuery {
                reason: "expected a SELECT query".to_string(),
            }),
        }
    }
}

fn timed<T>(op: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Instant::now();
    let result = f();
    metrics::record_backend_operation(BACKEND_NAME, op, result.as_ref().err(), started.elapsed());
    result
}
