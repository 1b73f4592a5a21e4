use crate::metrics::{Status, Timer};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Count of reports built. Should be labeled with the report and status (success or failure).
    describe_counter!("reports_total", "Total number of reports built");

    // Time spent building a report, including every upstream query.
    describe_histogram!(
        "report_duration_seconds",
        "Duration of building a report in seconds"
    );

    // Samples left out of a chart for lacking an enforcement label, labeled by report.
    describe_counter!(
        "chart_samples_dropped_total",
        "Total number of samples dropped while building charts"
    );

    // Number of categories on the axis of the last chart built, labeled by report.
    describe_gauge!(
        "chart_categories",
        "Number of categories in the most recent chart"
    );
}

/// Record a report with the given status
pub fn record_report(report: Report, status: Status) {
    counter!("reports_total", "report" => report.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record samples a chart left out
pub fn record_samples_dropped(report: Report, count: usize) {
    counter!("chart_samples_dropped_total", "report" => report.to_string())
        .increment(count as u64);
}

/// Record the axis length of a chart
pub fn record_chart_categories(report: Report, count: usize) {
    gauge!("chart_categories", "report" => report.to_string()).set(count as f64);
}

/// Create a timer for building a report
pub fn report_timer(report: Report) -> Timer {
    Timer::new("report_duration_seconds").with_label("report", report.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Violations,
    TopViolations,
    ViolationLog,
    Workloads,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::Violations => write!(f, "violations"),
            Report::TopViolations => write!(f, "top_violations"),
            Report::ViolationLog => write!(f, "violation_log"),
            Report::Workloads => write!(f, "workloads"),
        }
    }
}
