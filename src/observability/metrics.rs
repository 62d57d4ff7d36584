//! Metrics collection.
//!
//! # Metrics
//! - `yop_requests_total` (counter): calls by method and outcome
//! - `yop_request_duration_seconds` (histogram): end-to-end call latency
//! - `yop_chain_rejections_total` (counter): responses rejected, by analyzer
//! - `yop_upload_bytes_total` (counter): bytes streamed into upload bodies
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the host installs the exporter
//! - Outcome labels are a small fixed set to keep cardinality low

use std::time::Instant;

/// Record a finished call.
pub fn record_call(method: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "yop_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("yop_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a response rejected by the analyzer chain.
pub fn record_chain_rejection(analyzer: &'static str) {
    metrics::counter!("yop_chain_rejections_total", "analyzer" => analyzer).increment(1);
}

/// Record bytes copied from an upload source into a request body.
pub fn record_upload_bytes(bytes: u64) {
    metrics::counter!("yop_upload_bytes_total").increment(bytes);
}

/// Map a call result to its outcome label.
pub fn outcome_label<T>(result: &crate::error::YopResult<T>) -> &'static str {
    use crate::error::YopError;
    match result {
        Ok(_) => "ok",
        Err(e) if e.is_timeout() => "timeout",
        Err(YopError::Precondition(_)) => "precondition",
        Err(YopError::Signing(_)) => "signing",
        Err(YopError::Build(_)) => "build",
        Err(YopError::Transport(_)) => "transport",
        Err(YopError::Download { .. }) => "download",
        Err(YopError::Chain { .. }) => "rejected",
        Err(YopError::Config(_)) => "config",
    }
}
