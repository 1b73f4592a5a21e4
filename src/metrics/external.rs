use crate::metrics::Timer;
use metrics::{counter, describe_counter, describe_histogram};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Count of failed external requests. Should be labeled with the target and failure kind.
    describe_counter!(
        "external_request_failures_total",
        "Total number of failed external requests"
    );

    // Latency of external requests in seconds, labeled by the target.
    describe_histogram!(
        "external_request_duration_seconds",
        "Duration of external requests in seconds"
    );
}

/// Record an external request failure for a given target
pub fn record_external_request_failure(target: Target, kind: &'static str) {
    counter!("external_request_failures_total", "target" => target.to_string(), "kind" => kind)
        .increment(1);
}

/// Create a timer for an external request to a given target
pub fn external_request_timer(target: Target) -> Timer {
    Timer::new("external_request_duration_seconds").with_label("target", target.to_string())
}

#[derive(Debug, Clone, Copy)]
pub enum Target {
    Thanos,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Thanos => write!(f, "thanos"),
        }
    }
}
