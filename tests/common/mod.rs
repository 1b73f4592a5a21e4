#![allow(dead_code)]

use policy_chart_exporter::config::Config;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Config pointing at the mock query API
pub fn config(server: &MockServer) -> Config {
    Config::from_yaml(&format!(
        "thanos:\n  url: {}\n  timeoutSeconds: 5\n  concurrency: 2\n",
        server.uri()
    ))
    .expect("valid config")
}

/// One entry of an instant vector
pub fn sample(labels: &[(&str, &str)], value: &str) -> Value {
    let metric: serde_json::Map<String, Value> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

    json!({ "metric": metric, "value": [1718000000.0, value] })
}

/// Successful instant query response body
pub fn vector(result: Vec<Value>) -> Value {
    json!({
        "status": "success",
        "data": { "resultType": "vector", "result": result }
    })
}
