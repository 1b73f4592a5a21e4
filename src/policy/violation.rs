use crate::{chart::Enforcement, thanos::MetricSample};
use serde::Serialize;

/// A resource currently violating a policy
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyViolation {
    pub policy_template: String,
    pub policy: String,
    pub cluster: String,
    pub violating_kind: String,
    pub violating_namespace: String,
    pub violating_name: String,
    pub message: String,
    pub enforcement: String,
}

impl From<&MetricSample> for PolicyViolation {
    fn from(sample: &MetricSample) -> Self {
        let enforcement = sample.label("violation_enforcement");

        Self {
            policy_template: sample.label("kind").to_string(),
            policy: sample.label("name").to_string(),
            cluster: sample.label("taco_cluster").to_string(),
            violating_kind: sample.label("violating_kind").to_string(),
            violating_namespace: sample.label("violating_namespace").to_string(),
            violating_name: sample.label("violating_name").to_string(),
            message: sample.label("violation_msg").to_string(),
            enforcement: Enforcement::from_label(enforcement)
                .map(|e| e.to_string())
                .unwrap_or_else(|| enforcement.to_string()),
        }
    }
}
