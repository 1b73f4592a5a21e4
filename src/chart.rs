use crate::{config::SeriesNames, thanos::MetricSample};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, hash_map::Entry};

/// Bar chart payload consumed by the dashboard
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChartData {
    #[serde(rename = "xAxis")]
    pub x_axis: Axis,
    pub series: Vec<Series>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Axis {
    pub data: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub data: Vec<i64>,
}

/// How a policy violation is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Enforcement {
    Deny,
    Warn,
    Dryrun,
}

impl Enforcement {
    /// Series order of every chart
    pub const ALL: [Enforcement; 3] = [
        Enforcement::Deny,
        Enforcement::Warn,
        Enforcement::Dryrun,
    ];

    /// Map a `violation_enforcement` label value to its bucket.
    /// Gatekeeper leaves the label empty for the default (deny) action.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "" | "deny" => Some(Enforcement::Deny),
            "warn" => Some(Enforcement::Warn),
            "dryrun" => Some(Enforcement::Dryrun),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Enforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Enforcement::Deny => write!(f, "deny"),
            Enforcement::Warn => write!(f, "warn"),
            Enforcement::Dryrun => write!(f, "dryrun"),
        }
    }
}

impl SeriesNames {
    pub fn name(&self, enforcement: Enforcement) -> &str {
        match enforcement {
            Enforcement::Deny => &self.deny,
            Enforcement::Warn => &self.warn,
            Enforcement::Dryrun => &self.dryrun,
        }
    }
}

/// Violation totals of one category, per enforcement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Breakdown([i64; 3]);

impl Breakdown {
    /// Add to a bucket, clamping at the bounds of `i64`
    pub fn add(&mut self, enforcement: Enforcement, count: i64) {
        let total = &mut self.0[enforcement.index()];
        *total = total.saturating_add(count);
    }

    pub fn get(&self, enforcement: Enforcement) -> i64 {
        self.0[enforcement.index()]
    }

    /// Breakdown of a `sum by (violation_enforcement)` result
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a MetricSample>) -> Self {
        let mut breakdown = Self::default();
        for sample in samples {
            let label = sample.label("violation_enforcement");
            if let Some(enforcement) = Enforcement::from_label(label) {
                breakdown.add(enforcement, sample.count());
            }
        }
        breakdown
    }
}

impl ChartData {
    /// Assemble a chart from categories in display order
    pub fn from_rows(
        rows: impl IntoIterator<Item = (String, Breakdown)>,
        names: &SeriesNames,
    ) -> Self {
        let mut x_axis = Axis::default();
        let mut series: Vec<Series> = Enforcement::ALL
            .iter()
            .map(|&enforcement| Series {
                name: names.name(enforcement).to_string(),
                data: Vec::new(),
            })
            .collect();

        for (category, breakdown) in rows {
            x_axis.data.push(category);
            for (line, &enforcement) in series.iter_mut().zip(Enforcement::ALL.iter()) {
                line.data.push(breakdown.get(enforcement));
            }
        }

        Self { x_axis, series }
    }

    pub fn series(&self, enforcement: Enforcement) -> &Series {
        &self.series[enforcement.index()]
    }
}

/// Fold samples into a chart.
///
/// Samples with an empty enforcement label are skipped. Categories appear on the
/// axis in the order they are first seen and every series holds, per category, the
/// summed count of the samples carrying that enforcement.
pub fn reduce<'a, I, C, E>(
    samples: I,
    category: C,
    enforcement: E,
    names: &SeriesNames,
) -> ChartData
where
    I: IntoIterator<Item = &'a MetricSample>,
    C: Fn(&'a MetricSample) -> &'a str,
    E: Fn(&'a MetricSample) -> &'a str,
{
    let mut axis: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, Breakdown> = HashMap::new();

    for sample in samples {
        let label = enforcement(sample);
        if label.is_empty() {
            continue;
        }

        let category = category(sample);
        let breakdown = match totals.entry(category) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                axis.push(category);
                entry.insert(Breakdown::default())
            }
        };

        if let Some(bucket) = Enforcement::from_label(label) {
            breakdown.add(bucket, sample.count());
        }
    }

    let rows = axis.into_iter().map(|category| {
        let breakdown = totals.get(category).copied().unwrap_or_default();
        (category.to_string(), breakdown)
    });

    ChartData::from_rows(rows, names)
}

/// Number of samples [`reduce`] skips for lacking an enforcement label
pub fn unlabelled<'a, E>(
    samples: impl IntoIterator<Item = &'a MetricSample>,
    enforcement: E,
) -> usize
where
    E: Fn(&'a MetricSample) -> &'a str,
{
    samples
        .into_iter()
        .filter(|&sample| enforcement(sample).is_empty())
        .count()
}

/// [`reduce`] keyed by the policy template (`kind`) and `violation_enforcement` labels
pub fn violations_by_template<'a>(
    samples: impl IntoIterator<Item = &'a MetricSample>,
    names: &SeriesNames,
) -> ChartData {
    reduce(
        samples,
        |sample| sample.label("kind"),
        |sample| sample.label("violation_enforcement"),
        names,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: &str, enforcement: &str, value: &str) -> MetricSample {
        let mut metric = HashMap::new();
        metric.insert("kind".to_string(), kind.to_string());
        if !enforcement.is_empty() {
            metric.insert("violation_enforcement".to_string(), enforcement.to_string());
        }
        MetricSample {
            metric,
            value: (0.0, value.to_string()),
        }
    }

    fn data(chart: &ChartData, enforcement: Enforcement) -> &[i64] {
        &chart.series(enforcement).data
    }

    #[test]
    fn groups_by_category_in_first_seen_order() {
        let samples = vec![
            sample("A", "deny", "3"),
            sample("A", "warn", "1"),
            sample("B", "deny", "2"),
        ];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.x_axis.data, vec!["A", "B"]);
        assert_eq!(data(&chart, Enforcement::Deny), &[3, 2]);
        assert_eq!(data(&chart, Enforcement::Warn), &[1, 0]);
        assert_eq!(data(&chart, Enforcement::Dryrun), &[0, 0]);
    }

    #[test]
    fn axis_is_not_sorted() {
        let samples = vec![
            sample("Zeta", "dryrun", "1"),
            sample("Alpha", "warn", "1"),
            sample("Zeta", "warn", "1"),
        ];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.x_axis.data, vec!["Zeta", "Alpha"]);
        assert_eq!(data(&chart, Enforcement::Warn), &[1, 1]);
        assert_eq!(data(&chart, Enforcement::Dryrun), &[1, 0]);
    }

    #[test]
    fn sums_repeated_category_enforcement_pairs() {
        let samples = vec![
            sample("A", "deny", "3"),
            sample("B", "warn", "1"),
            sample("A", "deny", "4"),
            sample("A", "dryrun", "2"),
            sample("A", "dryrun", "5"),
        ];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.x_axis.data, vec!["A", "B"]);
        assert_eq!(data(&chart, Enforcement::Deny), &[7, 0]);
        assert_eq!(data(&chart, Enforcement::Warn), &[0, 1]);
        assert_eq!(data(&chart, Enforcement::Dryrun), &[7, 0]);
    }

    #[test]
    fn totals_clamp_instead_of_overflowing() {
        let samples = vec![
            sample("A", "deny", "9223372036854775807"),
            sample("A", "deny", "1"),
            sample("A", "warn", "-9223372036854775808"),
            sample("A", "warn", "-1"),
        ];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(data(&chart, Enforcement::Deny), &[i64::MAX]);
        assert_eq!(data(&chart, Enforcement::Warn), &[i64::MIN]);
    }

    #[test]
    fn counts_unlabelled_samples() {
        let samples = vec![
            sample("A", "", "9"),
            sample("A", "deny", "1"),
            sample("B", "", "2"),
        ];

        let skipped = unlabelled(&samples, |s| s.label("violation_enforcement"));

        assert_eq!(skipped, 2);
    }

    #[test]
    fn skips_samples_without_enforcement_label() {
        let samples = vec![
            sample("OnlyEmpty", "", "9"),
            sample("A", "deny", "1"),
            sample("A", "", "9"),
        ];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.x_axis.data, vec!["A"]);
        assert_eq!(data(&chart, Enforcement::Deny), &[1]);
    }

    #[test]
    fn non_numeric_value_counts_zero() {
        let samples = vec![sample("A", "deny", "abc"), sample("A", "deny", "2")];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(data(&chart, Enforcement::Deny), &[2]);
    }

    #[test]
    fn unknown_enforcement_keeps_category_with_zero_counts() {
        let samples = vec![sample("A", "audit", "4")];

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.x_axis.data, vec!["A"]);
        for enforcement in Enforcement::ALL {
            assert_eq!(data(&chart, enforcement), &[0]);
        }
    }

    #[test]
    fn every_series_is_aligned_with_the_axis() {
        let samples: Vec<_> = (0..20)
            .map(|i| {
                let enforcement = ["deny", "warn", "dryrun", ""][i % 4];
                sample(&format!("T{}", i % 7), enforcement, &i.to_string())
            })
            .collect();

        let chart = violations_by_template(&samples, &SeriesNames::default());

        assert_eq!(chart.series.len(), 3);
        for series in &chart.series {
            assert_eq!(series.data.len(), chart.x_axis.data.len());
        }
    }

    #[test]
    fn empty_input_yields_three_empty_series() {
        let chart = violations_by_template(&Vec::new(), &SeriesNames::default());

        assert!(chart.x_axis.data.is_empty());
        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Deny", "Warn", "Dry run"]);
        assert!(chart.series.iter().all(|s| s.data.is_empty()));
    }

    #[test]
    fn custom_key_functions() {
        let mut with_cluster = sample("A", "warn", "2");
        with_cluster
            .metric
            .insert("taco_cluster".to_string(), "c1".to_string());

        let samples = vec![with_cluster];
        let chart = reduce(
            &samples,
            |s| s.label("taco_cluster"),
            |s| s.label("violation_enforcement"),
            &SeriesNames::default(),
        );

        assert_eq!(chart.x_axis.data, vec!["c1"]);
        assert_eq!(data(&chart, Enforcement::Warn), &[2]);
    }

    #[test]
    fn breakdown_treats_empty_label_as_deny() {
        let samples = vec![
            sample("A", "", "5"),
            sample("A", "warn", "2"),
            sample("A", "dryrun", "x"),
        ];

        let breakdown = Breakdown::from_samples(&samples);

        assert_eq!(breakdown.get(Enforcement::Deny), 5);
        assert_eq!(breakdown.get(Enforcement::Warn), 2);
        assert_eq!(breakdown.get(Enforcement::Dryrun), 0);
    }

    #[test]
    fn serializes_with_chart_key_names() {
        let samples = vec![sample("A", "deny", "3")];
        let names = SeriesNames {
            deny: "거부".to_string(),
            warn: "경고".to_string(),
            dryrun: "감사".to_string(),
        };

        let json = serde_json::to_value(violations_by_template(&samples, &names)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "xAxis": { "data": ["A"] },
                "series": [
                    { "name": "거부", "data": [3] },
                    { "name": "경고", "data": [0] },
                    { "name": "감사", "data": [0] }
                ]
            })
        );
    }
}
