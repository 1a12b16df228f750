use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_backend_operation(
    backend: &str,
    operation: &str,
    status: &str,
    error_class: &str,
    duration: Duration,
) {
    counter!(
        "graph_acl_backend_operation_total",
        "backend" => backend.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string(),
        "error_class" => error_class.to_string()
    )
    .increment(1);
    histogram!(
        "graph_acl_backend_operation_duration_seconds",
        "backend" => backend.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}
