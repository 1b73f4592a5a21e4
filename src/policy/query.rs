//! PromQL expressions behind each report.

/// Gauge exported by the OPA scorecard exporter, one series per violating resource
pub const VIOLATIONS_METRIC: &str = "opa_scorecard_constraint_violations";

pub const AVAILABLE_REPLICAS_METRIC: &str = "kube_deployment_status_replicas_available";

/// Quote a value as a PromQL double-quoted string literal
pub fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// `taco_cluster=~"c1|c2"` matcher selecting any of the given clusters
pub fn cluster_matcher(clusters: &[String]) -> String {
    let pattern = clusters
        .iter()
        .map(|cluster| regex::escape(cluster))
        .collect::<Vec<_>>()
        .join("|");

    format!("taco_cluster=~{}", string_literal(&pattern))
}

/// Violation counts per policy template, policy and enforcement
pub fn violations_by_template(clusters: &[String]) -> String {
    format!(
        "sum by (kind, name, violation_enforcement) ({}{{{}}})",
        VIOLATIONS_METRIC,
        cluster_matcher(clusters)
    )
}

/// The `limit` policy templates with the most violations
pub fn top_templates(clusters: &[String], limit: usize) -> String {
    format!(
        "topk ({}, sum by (kind) ({}{{{}}}))",
        limit,
        VIOLATIONS_METRIC,
        cluster_matcher(clusters)
    )
}

/// Violation counts of one policy template per enforcement
pub fn enforcement_breakdown(clusters: &[String], template: &str) -> String {
    format!(
        "sum by (violation_enforcement) ({}{{{}, kind={}}})",
        VIOLATIONS_METRIC,
        cluster_matcher(clusters),
        string_literal(template)
    )
}

/// Every violating resource with its policy and message
pub fn violation_log(clusters: &[String]) -> String {
    format!(
        "group ({}{{{}}}) by (violating_kind, violating_namespace, violating_name, name, kind, violation_enforcement, violation_msg, taco_cluster)",
        VIOLATIONS_METRIC,
        cluster_matcher(clusters)
    )
}

/// Number of deployments with at least one available replica
pub fn available_workloads(clusters: &[String]) -> String {
    format!(
        "count ({}{{{}}} != 0)",
        AVAILABLE_REPLICAS_METRIC,
        cluster_matcher(clusters)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_clusters_into_regex_matcher() {
        assert_eq!(
            cluster_matcher(&clusters(&["c1", "c2", "c3"])),
            r#"taco_cluster=~"c1|c2|c3""#
        );
    }

    #[test]
    fn escapes_regex_and_string_metacharacters() {
        assert_eq!(
            cluster_matcher(&clusters(&["prod.eu", "a\"b"])),
            r#"taco_cluster=~"prod\\.eu|a\"b""#
        );
        assert_eq!(string_literal(r"K8s\Labels"), r#""K8s\\Labels""#);
    }

    #[test]
    fn violation_chart_query() {
        assert_eq!(
            violations_by_template(&clusters(&["c1", "c2"])),
            r#"sum by (kind, name, violation_enforcement) (opa_scorecard_constraint_violations{taco_cluster=~"c1|c2"})"#
        );
    }

    #[test]
    fn top_n_queries() {
        let clusters = clusters(&["c3"]);

        assert_eq!(
            top_templates(&clusters, 5),
            r#"topk (5, sum by (kind) (opa_scorecard_constraint_violations{taco_cluster=~"c3"}))"#
        );
        assert_eq!(
            enforcement_breakdown(&clusters, "K8sRequiredLabels"),
            r#"sum by (violation_enforcement) (opa_scorecard_constraint_violations{taco_cluster=~"c3", kind="K8sRequiredLabels"})"#
        );
    }

    #[test]
    fn workload_query() {
        assert_eq!(
            available_workloads(&clusters(&["c3", "c5"])),
            r#"count (kube_deployment_status_replicas_available{taco_cluster=~"c3|c5"} != 0)"#
        );
    }
}
