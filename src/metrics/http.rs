use crate::metrics::Timer;
use metrics::{counter, describe_counter, describe_histogram};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    describe_counter!("http_requests_total", "Requests served, per route");

    describe_histogram!(
        "http_request_duration_seconds",
        "Time spent serving a request, per route"
    );
}

/// Count a request to `route` and time it until the returned guard is dropped
pub fn track_request(route: &'static str) -> Timer {
    counter!("http_requests_total", "route" => route).increment(1);

    Timer::new("http_request_duration_seconds").with_label("route", route)
}
