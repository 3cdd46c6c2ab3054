// HTTP routes: version plus the per-project history endpoints

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::history_repo::HistoryRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<HistoryRepo>,
    pub(crate) config: AppConfig,
}

pub fn app(repo: Arc<HistoryRepo>, config: AppConfig) -> Router {
    let state = AppState { repo, config };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route(
            "/{project}/api/api_requests/history",
            get(http::request_history_handler),
        )
        .route(
            "/{project}/api/api_requests/latency_history",
            get(http::latency_history_handler),
        )
        .route(
            "/{project}/api/background_jobs/history",
            get(http::job_history_handler),
        )
        .route("/{project}/api/host_metrics", get(http::host_metrics_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
