use metrics::{counter, histogram};

pub fn record_access_denied(operation: &str, reason: &str) {
    counter!(
        "graph_acl_access_denied_total",
        "operation" => operation.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_statements_filtered(operation: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "graph_acl_statements_filtered_total",
        "operation" => operation.to_string()
    )
    .increment(count);
}

pub fn record_statements_redacted(count: u64) {
    if count == 0 {
        return;
    }
    counter!("graph_acl_statements_redacted_total").increment(count);
}

pub fn record_wildcard_remove(matched_graphs: usize, removed_graphs: usize) {
    histogram!("graph_acl_wildcard_remove_matched_graphs").record(matched_graphs as f64);
    histogram!("graph_acl_wildcard_remove_graphs").record(removed_graphs as f64);
}

pub fn record_default_write_graph_downgraded() {
    counter!("graph_acl_default_write_graph_downgraded_total").increment(1);
}
