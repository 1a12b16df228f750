use std::time::Duration;

use graph_acl_observability as observability;

use crate::error::StoreError;

pub(crate) fn record_backend_operation(
    backend: &str,
    op: &str,
    error: Option<&StoreError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_error);

    observability::record_backend_operation(backend, op, status, error_class, duration);
}

pub(crate) fn record_access_denied(op: &str, reason: &str) {
    observability::record_access_denied(op, reason);
}

pub(crate) fn record_statements_filtered(op: &str, filtered: u64, redacted: u64) {
    observability::record_statements_filtered(op, filtered);
    observability::record_statements_redacted(redacted);
}

pub(crate) fn record_wildcard_remove(matched_graphs: usize, removed_graphs: usize) {
    observability::record_wildcard_remove(matched_graphs, removed_graphs);
}

pub(crate) fn record_default_write_graph_downgraded() {
    observability::record_default_write_graph_downgraded();
}

fn classify_error(error: &StoreError) -> &'static str {
    match error {
        StoreError::Storage(_) => "storage",
        StoreError::QueryEvaluation(_) => "query_evaluation",
        StoreError::QuerySyntax(_) => "query_syntax",
        StoreError::InvalidIri(_) => "invalid_iri",
        StoreError::InvalidQuery { .. } => "invalid_query",
        StoreError::ConnectionClosed => "connection_closed",
        StoreError::TransactionAlreadyActive | StoreError::NoActiveTransaction => "transaction",
        StoreError::Config(_) => "config",
        StoreError::Io(_) => "io",
        StoreError::Other(_) => "other",
    }
}
