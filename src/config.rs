use anyhow::Result;
use serde::Deserialize;
use std::{path::Path, time::Duration};

impl Config {
    /// Override the Thanos query endpoint, e.g. from a command line flag
    pub fn with_thanos_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.thanos.url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub thanos: Thanos,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub charts: Charts,
}

#[derive(Debug, Clone)]
pub struct Thanos {
    pub url: String,
    pub timeout: Duration,
    pub max_idle_connections: usize,
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Http {
    pub host: String,
    pub port: u16,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Charts {
    #[serde(rename = "seriesNames", default)]
    pub series_names: SeriesNames,
    #[serde(rename = "topLimit", default = "default_top_limit")]
    pub top_limit: usize,
}

impl Default for Charts {
    fn default() -> Self {
        Self {
            series_names: SeriesNames::default(),
            top_limit: default_top_limit(),
        }
    }
}

/// Display names of the deny, warn and dryrun series
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SeriesNames {
    pub deny: String,
    pub warn: String,
    pub dryrun: String,
}

impl Default for SeriesNames {
    fn default() -> Self {
        Self {
            deny: "Deny".to_string(),
            warn: "Warn".to_string(),
            dryrun: "Dry run".to_string(),
        }
    }
}

fn default_top_limit() -> usize {
    5
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from file");

        let config = std::fs::read_to_string(path)?;
        Self::from_yaml(&config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(config: &str) -> Result<Self> {
        Ok(serde_norway::from_str(config)?)
    }
}

impl Thanos {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Create a new Thanos config, resolving the URL from an environment variable if needed
    pub fn new(url: Option<String>, url_from: Option<String>) -> anyhow::Result<Self> {
        let url = match (url, url_from) {
            (Some(url), _) => url,
            (None, Some(var)) => std::env::var(&var)
                .map_err(|e| anyhow::anyhow!("Failed to read Thanos URL from ${}: {}", var, e))?,
            (None, None) => return Err(anyhow::anyhow!("thanos.url or thanos.urlFrom is required")),
        };

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            max_idle_connections: Self::DEFAULT_MAX_IDLE_CONNECTIONS,
            concurrency: Self::DEFAULT_CONCURRENCY,
        })
    }
}

impl<'de> Deserialize<'de> for Thanos {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ThanosRaw {
            url: Option<String>,
            #[serde(rename = "urlFrom")]
            url_from: Option<String>,
            #[serde(rename = "timeoutSeconds")]
            timeout_seconds: Option<u64>,
            #[serde(rename = "maxIdleConnections")]
            max_idle_connections: Option<usize>,
            concurrency: Option<usize>,
        }

        let raw = ThanosRaw::deserialize(deserializer)?;
        let mut thanos = Thanos::new(raw.url, raw.url_from).map_err(serde::de::Error::custom)?;

        if let Some(secs) = raw.timeout_seconds {
            thanos.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = raw.max_idle_connections {
            thanos.max_idle_connections = max;
        }
        if let Some(concurrency) = raw.concurrency {
            // zero would stall the top-N fan-out
            thanos.concurrency = concurrency.max(1);
        }

        Ok(thanos)
    }
}
