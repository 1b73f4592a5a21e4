use crate::{
    chart::{self, Breakdown, ChartData},
    config::{Config, SeriesNames},
    metrics::reports::{
        Report, record_chart_categories, record_report, record_samples_dropped, report_timer,
    },
    thanos::{QueryError, Thanos},
};
use futures::{StreamExt, TryStreamExt, stream};

pub mod query;
pub mod violation;

pub use violation::PolicyViolation;

/// Builds the policy dashboard reports from Thanos
pub struct Policies {
    thanos: Thanos,
    series_names: SeriesNames,
    concurrency: usize,
}

impl Policies {
    /// Create a new Policies instance
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let thanos = Thanos::new(&config.thanos)?;

        Ok(Self {
            thanos,
            series_names: config.charts.series_names.clone(),
            concurrency: config.thanos.concurrency.max(1),
        })
    }

    /// Violations per policy template and enforcement
    #[tracing::instrument(skip(self))]
    pub async fn violation_chart(&self, clusters: &[String]) -> Result<ChartData, QueryError> {
        let _timer = report_timer(Report::Violations);

        let result = self
            .thanos
            .query(&query::violations_by_template(clusters))
            .await
            .map(|response| {
                let skipped = chart::unlabelled(response.samples(), |sample| {
                    sample.label("violation_enforcement")
                });
                if skipped > 0 {
                    tracing::debug!("Skipped {} samples without an enforcement label", skipped);
                    record_samples_dropped(Report::Violations, skipped);
                }

                chart::violations_by_template(response.samples(), &self.series_names)
            });

        finish(Report::Violations, result)
    }

    /// Violations per enforcement of the `limit` policy templates with the most violations.
    ///
    /// The per-template breakdowns are queried concurrently, at most `concurrency` at a
    /// time, and the chart keeps the ranking order of the top-N query.
    #[tracing::instrument(skip(self))]
    pub async fn top_violation_chart(
        &self,
        clusters: &[String],
        limit: usize,
    ) -> Result<ChartData, QueryError> {
        let _timer = report_timer(Report::TopViolations);

        let result = self
            .top_rows(clusters, limit)
            .await
            .map(|rows| ChartData::from_rows(rows, &self.series_names));

        finish(Report::TopViolations, result)
    }

    async fn top_rows(
        &self,
        clusters: &[String],
        limit: usize,
    ) -> Result<Vec<(String, Breakdown)>, QueryError> {
        let top = self.thanos.query(&query::top_templates(clusters, limit)).await?;

        let templates: Vec<String> = top
            .samples()
            .iter()
            .map(|sample| sample.label("kind").to_string())
            .collect();

        tracing::info!("Top policy templates: {:?}", templates);

        stream::iter(templates)
            .map(|template| async move {
                let response = self
                    .thanos
                    .query(&query::enforcement_breakdown(clusters, &template))
                    .await?;
                let breakdown = Breakdown::from_samples(response.samples());

                tracing::debug!(
                    "Policy template {}: deny {}, warn {}, dryrun {}",
                    template,
                    breakdown.get(chart::Enforcement::Deny),
                    breakdown.get(chart::Enforcement::Warn),
                    breakdown.get(chart::Enforcement::Dryrun),
                );

                Ok::<_, QueryError>((template, breakdown))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Every resource currently violating a policy
    #[tracing::instrument(skip(self))]
    pub async fn violation_log(
        &self,
        clusters: &[String],
    ) -> Result<Vec<PolicyViolation>, QueryError> {
        let _timer = report_timer(Report::ViolationLog);

        let result = self
            .thanos
            .query(&query::violation_log(clusters))
            .await
            .map(|response| {
                response
                    .samples()
                    .iter()
                    .map(PolicyViolation::from)
                    .collect::<Vec<_>>()
            });

        if let Ok(violations) = &result {
            tracing::info!("Found {} policy violations", violations.len());
        }
        record_report(Report::ViolationLog, (&result).into());

        result
    }

    /// Number of deployments with at least one available replica
    #[tracing::instrument(skip(self))]
    pub async fn workload_count(&self, clusters: &[String]) -> Result<i64, QueryError> {
        let _timer = report_timer(Report::Workloads);

        let result = self
            .thanos
            .query(&query::available_workloads(clusters))
            .await
            .map(|response| {
                response
                    .samples()
                    .iter()
                    .fold(0i64, |total, sample| total.saturating_add(sample.count()))
            });

        record_report(Report::Workloads, (&result).into());

        result
    }
}

fn finish(report: Report, result: Result<ChartData, QueryError>) -> Result<ChartData, QueryError> {
    if let Ok(chart) = &result {
        record_chart_categories(report, chart.x_axis.data.len());
    }
    record_report(report, (&result).into());

    result
}
