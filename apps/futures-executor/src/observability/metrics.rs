//! Metrics for the futures executor.
//!
//! Recorded through the `metrics` facade. Without an installed recorder
//! every call is a no-op, so the binary and tests pay nothing unless an
//! exporter is wired in.
//!
//! # Example
//!
//! ```ignore
//! use futures_executor::observability::metrics::record_order_submission;
//!
//! record_order_submission("FILLED", "MARKET");
//! ```

use metrics::{counter, gauge, histogram};

// ============================================================================
// Gateway Metrics
// ============================================================================

/// Record one exchange gateway request.
///
/// # Arguments
///
/// * `operation` - Gateway operation (e.g., "get_symbol_rules", "submit_order")
/// * `outcome` - "ok" or an error code
/// * `latency_seconds` - Request duration in seconds
pub fn record_gateway_request(operation: &str, outcome: &str, latency_seconds: f64) {
    counter!(
        "gateway_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(latency_seconds);
}

/// Record an HTTP retry against the exchange.
pub fn record_gateway_retry(operation: &str, reason: &str) {
    counter!(
        "gateway_retries_total",
        "operation" => operation.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

// ============================================================================
// Order Metrics
// ============================================================================

/// Record an order submission result.
///
/// # Arguments
///
/// * `status` - Exchange status (e.g., "FILLED", "NEW") or error code
/// * `order_type` - Order type (e.g., "MARKET", "LIMIT")
pub fn record_order_submission(status: &str, order_type: &str) {
    counter!(
        "order_submissions_total",
        "status" => status.to_string(),
        "order_type" => order_type.to_string()
    )
    .increment(1);
}

/// Update the open orders gauge for a symbol.
pub fn update_open_orders(symbol: &str, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("open_orders", "symbol" => symbol.to_string()).set(count as f64);
}

// ============================================================================
// Workflow Metrics
// ============================================================================

/// Record the end of a workflow run.
///
/// # Arguments
///
/// * `outcome` - "reconciled" or the error code that ended the run
/// * `last_state` - Last state reached before completion or failure
/// * `duration_seconds` - Wall time of the run
pub fn record_workflow_run(outcome: &str, last_state: &str, duration_seconds: f64) {
    counter!(
        "workflow_runs_total",
        "outcome" => outcome.to_string(),
        "last_state" => last_state.to_string()
    )
    .increment(1);

    histogram!("workflow_duration_seconds").record(duration_seconds);
}
