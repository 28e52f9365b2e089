//! Metrics collection and exposition.
//!
//! # Metrics
//! - `twlog_lines_written_total` (counter): access lines handed to the sink, by status class
//! - `twlog_requests_skipped_total` (counter): requests suppressed by the skip predicate
//! - `twlog_buffer_flushes_total` (counter): batched writes to the stream
//! - `twlog_buffer_flushed_lines` (histogram): lines per batched write
//! - `twlog_response_time_seconds` (histogram): time from request to completion
//! - `twlog_error_reports_total` (counter): notifier outcomes by `outcome`

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_line(status: Option<u16>, elapsed: Option<Duration>) {
    let class = match status {
        Some(s) => format!("{}xx", s / 100),
        None => "none".to_string(),
    };
    counter!("twlog_lines_written_total", "status" => class).increment(1);
    if let Some(elapsed) = elapsed {
        histogram!("twlog_response_time_seconds").record(elapsed.as_secs_f64());
    }
}

pub fn record_skipped() {
    counter!("twlog_requests_skipped_total").increment(1);
}

pub fn record_flush(lines: usize) {
    counter!("twlog_buffer_flushes_total").increment(1);
    histogram!("twlog_buffer_flushed_lines").record(lines as f64);
}

pub fn record_error_report(outcome: &'static str) {
    counter!("twlog_error_reports_total", "outcome" => outcome).increment(1);
}
