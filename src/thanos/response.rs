use serde::Deserialize;
use std::collections::HashMap;

/// Body of an instant query (`/api/v1/query`) response
#[derive(Deserialize, Debug, Clone)]
pub struct MetricResponse {
    pub status: Status,
    #[serde(default)]
    pub data: Data,
    #[serde(rename = "errorType")]
    pub error_type: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Data {
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<MetricSample>,
}

/// One series of an instant vector: its label set and `[timestamp, "value"]` pair
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MetricSample {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    pub value: (f64, String),
}

impl MetricResponse {
    /// Samples of the result vector, in response order
    pub fn samples(&self) -> &[MetricSample] {
        &self.data.result
    }
}

impl MetricSample {
    /// Value of a label, empty when the series does not carry it
    pub fn label(&self, name: &str) -> &str {
        self.metric.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Sample value as an integer count. Values that are not integers count as zero.
    pub fn count(&self) -> i64 {
        self.value.1.parse().unwrap_or(0)
    }

    pub fn timestamp(&self) -> f64 {
        self.value.0
    }
}
