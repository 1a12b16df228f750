//! Lazy permission filters over store iterators.
//!
//! Both iterators check the live permission sets on every `next()` call, so a
//! permission change made while a read is in flight applies to the elements
//! not yet yielded.

use std::sync::Arc;

use oxigraph::model::{GraphName, NamedOrBlankNode, Quad};

use crate::{
    backend::{ContextIter, StatementIter},
    error::Result,
    metrics,
    permissions::PermissionSet,
};

/// Statements from readable graphs only, optionally redacting graphs the
/// caller cannot write.
pub struct ReadableStatements<'a> {
    source: Option<StatementIter<'a>>,
    readable: Arc<PermissionSet>,
    writable: Arc<PermissionSet>,
    hide_non_writable: bool,
    filtered: u64,
    redacted: u64,
}

impl<'a> ReadableStatements<'a> {
    pub fn new(
        source: StatementIter<'a>,
        readable: Arc<PermissionSet>,
        writable: Arc<PermissionSet>,
        hide_non_writable: bool,
    ) -> Self {
        Self {
            source: Some(source),
            readable,
            writable,
            hide_non_writable,
            filtered: 0,
            redacted: 0,
        }
    }

    /// Release the underlying iteration. Later calls to `next` yield nothing.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            metrics::record_statements_filtered("get_statements", self.filtered, self.redacted);
            self.filtered = 0;
            self.redacted = 0;
        }
    }

    fn admit(&mut self, mut quad: Quad) -> Option<Quad> {
        if !self.readable.permits(&quad.graph_name) {
            self.filtered += 1;
            return None;
        }
        if self.hide_non_writable && !self.writable.permits(&quad.graph_name) {
            quad.graph_name = GraphName::DefaultGraph;
            self.redacted += 1;
        }
        Some(quad)
    }
}

impl Iterator for ReadableStatements<'_> {
    type Item = Result<Quad>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.source.as_mut()?.next();
            match next {
                None => {
                    self.close();
                    return None;
                }
                Some(Err(error)) => return Some(Err(error)),
                Some(Ok(quad)) => {
                    if let Some(quad) = self.admit(quad) {
                        return Some(Ok(quad));
                    }
                }
            }
        }
    }
}

impl Drop for ReadableStatements<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Named graphs the caller may read.
pub struct ReadableContexts<'a> {
    source: Option<ContextIter<'a>>,
    readable: Arc<PermissionSet>,
}

impl<'a> ReadableContexts<'a> {
    pub fn new(source: ContextIter<'a>, readable: Arc<PermissionSet>) -> Self {
        Self {
            source: Some(source),
            readable,
        }
    }

    pub fn close(&mut self) {
        self.source = None;
    }
}

impl Iterator for ReadableContexts<'_> {
    type Item = Result<NamedOrBlankNode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.source.as_mut()?.next();
            match next {
                None => {
                    self.close();
                    return None;
                }
                Some(Err(error)) => return Some(Err(error)),
                Some(Ok(graph)) if self.readable.contains(&graph) => return Some(Ok(graph)),
                Some(Ok(_)) => {}
            }
        }
    }
}
