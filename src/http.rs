use crate::{
    config::Config,
    metrics::{METRICS_HANDLE, http::track_request},
    policy::Policies,
    thanos::QueryError,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use hyper::StatusCode;
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};

pub struct AppState {
    pub policies: Policies,
    pub top_limit: usize,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            policies: Policies::new(config)?,
            top_limit: config.charts.top_limit,
        })
    }
}

/// Creates an Axum Web Server
pub async fn create_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting the web server");

    let state = Arc::new(AppState::new(&config)?);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Unable to parse address: {}", e))?;

    tracing::info!("Listening on {}", addr);

    axum_server::bind(addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

/// Create the router for the application
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/metrics", get(metrics))
        .route("/api/v1/charts/violations", get(violation_chart))
        .route("/api/v1/charts/violations/top", get(top_violation_chart))
        .route("/api/v1/violations", get(violation_log))
        .route("/api/v1/workloads", get(workload_count))
        .with_state(state)
}

#[derive(Deserialize, Debug, Default)]
pub struct ReportParams {
    /// Comma separated cluster names
    pub clusters: Option<String>,
    pub limit: Option<usize>,
}

impl ReportParams {
    fn clusters(&self) -> Result<Vec<String>, ApiError> {
        let clusters = parse_clusters(self.clusters.as_deref().unwrap_or_default());

        if clusters.is_empty() {
            return Err(ApiError::BadRequest(
                "query parameter 'clusters' is required".to_string(),
            ));
        }

        Ok(clusters)
    }
}

/// Split a comma separated cluster list, dropping blanks
pub fn parse_clusters(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|cluster| !cluster.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(QueryError),
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        ApiError::Upstream(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(error) => {
                tracing::error!("Upstream query failed: {}", error);
                (StatusCode::BAD_GATEWAY, error.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// This is the handler for the /alive path
async fn alive() -> StatusCode {
    let _timer = track_request("/alive");

    StatusCode::OK
}

/// This is the handler for the /metrics path
async fn metrics() -> impl IntoResponse {
    let _timer = track_request("/metrics");

    match METRICS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to get the metrics handle".to_string(),
        ),
    }
}

/// This is the handler for the /api/v1/charts/violations path
#[tracing::instrument(skip(state))]
async fn violation_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let _timer = track_request("/api/v1/charts/violations");

    let clusters = params.clusters()?;
    let chart = state.policies.violation_chart(&clusters).await?;

    Ok(Json(chart).into_response())
}

/// This is the handler for the /api/v1/charts/violations/top path
#[tracing::instrument(skip(state))]
async fn top_violation_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let _timer = track_request("/api/v1/charts/violations/top");

    let clusters = params.clusters()?;
    let limit = params.limit.unwrap_or(state.top_limit);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }

    let chart = state
        .policies
        .top_violation_chart(&clusters, limit)
        .await?;

    Ok(Json(chart).into_response())
}

/// This is the handler for the /api/v1/violations path
#[tracing::instrument(skip(state))]
async fn violation_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let _timer = track_request("/api/v1/violations");

    let clusters = params.clusters()?;
    let violations = state.policies.violation_log(&clusters).await?;

    Ok(Json(violations).into_response())
}

/// This is the handler for the /api/v1/workloads path
#[tracing::instrument(skip(state))]
async fn workload_count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let _timer = track_request("/api/v1/workloads");

    let clusters = params.clusters()?;
    let count = state.policies.workload_count(&clusters).await?;

    Ok(Json(serde_json::json!({ "count": count })).into_response())
}
