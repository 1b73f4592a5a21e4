use metrics::{describe_gauge, gauge};
use std::time::{SystemTime, UNIX_EPOCH};

/// Register the metrics for the application and record their values once
pub(super) fn register_metrics() {
    describe_gauge!(
        "process_start_time_seconds",
        "Unix time at which the exporter started"
    );
    describe_gauge!("build_info", "Always 1; the version label carries the crate version");

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_secs_f64())
        .unwrap_or_default();

    gauge!("process_start_time_seconds").set(started);
    gauge!("build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}
