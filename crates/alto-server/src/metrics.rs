//! Prometheus metrics

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "alto_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "alto_request_duration_seconds";

/// Install the global Prometheus recorder. Call once per process.
pub fn init_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    ::metrics::describe_counter!(REQUESTS_TOTAL, "ALTO requests by resource and status");
    ::metrics::describe_histogram!(
        REQUEST_DURATION_SECONDS,
        ::metrics::Unit::Seconds,
        "ALTO request latency by resource"
    );
    Ok(handle)
}

/// Record one finished request; a no-op when no recorder is installed
pub fn record_request(resource: &'static str, status: u16, elapsed: Duration) {
    ::metrics::counter!(REQUESTS_TOTAL, "resource" => resource, "status" => status.to_string())
        .increment(1);
    ::metrics::histogram!(REQUEST_DURATION_SECONDS, "resource" => resource)
        .record(elapsed.as_secs_f64());
}
