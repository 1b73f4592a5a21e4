use crate::{
    config::Thanos as ThanosConfig,
    metrics::external::{Target, external_request_timer, record_external_request_failure},
};
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};

pub mod response;

pub use response::{MetricResponse, MetricSample};

/// Errors surfaced by a Thanos instant query. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to call thanos: {0}")]
    Network(#[source] reqwest::Error),

    #[error("invalid http status. return code: {0}")]
    HttpStatus(u16),

    #[error("failed to read response body: {0}")]
    BodyRead(#[source] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("query rejected by thanos ({error_type}): {error}")]
    Query { error_type: String, error: String },
}

impl QueryError {
    /// Short failure class, used as a metric label
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Network(_) => "network",
            QueryError::HttpStatus(_) => "http_status",
            QueryError::BodyRead(_) => "body_read",
            QueryError::Decode(_) => "decode",
            QueryError::Query { .. } => "query",
        }
    }
}

pub struct Thanos {
    endpoint: Url,
    client: Client,
}

impl Thanos {
    /// Create a new Thanos instance
    pub fn new(config: &ThanosConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&format!("{}/api/v1/query", config.url))
            .map_err(|e| anyhow::anyhow!("Invalid Thanos URL '{}': {}", config.url, e))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .build()?;

        Ok(Self { endpoint, client })
    }

    /// Build the request URL for an instant query
    pub fn query_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("query", query);
        url
    }

    /// Run an instant query and return the raw response body
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, query: &str) -> Result<Bytes, QueryError> {
        let _timer = external_request_timer(Target::Thanos);

        let result = self.fetch_inner(query).await;
        if let Err(e) = &result {
            tracing::warn!("Thanos query failed: {}", e);
            record_external_request_failure(Target::Thanos, e.kind());
        }

        result
    }

    async fn fetch_inner(&self, query: &str) -> Result<Bytes, QueryError> {
        let url = self.query_url(query);
        tracing::debug!("Querying {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(QueryError::Network)?;

        if resp.status() != StatusCode::OK {
            return Err(QueryError::HttpStatus(resp.status().as_u16()));
        }

        resp.bytes().await.map_err(QueryError::BodyRead)
    }

    /// Run an instant query and decode the result vector
    pub async fn query(&self, query: &str) -> Result<MetricResponse, QueryError> {
        let body = self.fetch(query).await?;
        let response = decode(&body)?;

        tracing::debug!("Query returned {} samples", response.samples().len());

        Ok(response)
    }
}

/// Decode a query response body, turning `status: error` into a [`QueryError::Query`]
pub fn decode(body: &[u8]) -> Result<MetricResponse, QueryError> {
    let response: MetricResponse = serde_json::from_slice(body)?;

    if response.status == response::Status::Error {
        let error = QueryError::Query {
            error_type: response.error_type.unwrap_or_default(),
            error: response.error.unwrap_or_default(),
        };
        record_external_request_failure(Target::Thanos, error.kind());
        return Err(error);
    }

    Ok(response)
}
