// GET handlers: version and the history endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::downsample;
use crate::error::HistoryError;
use crate::history::{self, GroupBy};
use crate::models::{HistoryResponse, MetricsPage, PageMeta, PageParams, Pagination, Project};
use crate::store::BucketQuery;
use crate::timespan::{TimeBucket, TimeSpan};
use crate::version::{NAME, VERSION};

/// Query-string parameters shared by every history endpoint. Everything is kept
/// as a raw string so that coercion rules live in one place.
#[derive(Debug, Default, Deserialize)]
pub(super) struct HistoryParams {
    span_type: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    bucket_size: Option<String>,
    group_by: Option<String>,
    min_sample_spacing: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

impl HistoryParams {
    fn span(&self) -> Result<TimeSpan, HistoryError> {
        TimeSpan::resolve(
            self.span_type.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }

    /// Resolved span and bucket, rejected before any store call when the bucket
    /// sequence would exceed `max_buckets`.
    fn bucket_query(
        &self,
        project: &Project,
        max_buckets: u32,
    ) -> Result<BucketQuery, HistoryError> {
        let bucket = TimeBucket::parse(self.bucket_size.as_deref().unwrap_or_default())?;
        let span = self.span()?;
        let query = BucketQuery {
            project_id: project.id,
            span,
            bucket,
        };
        let count = query.bucket_count();
        tracing::debug!(
            project = %project.slug,
            %bucket,
            start = %span.start(),
            end = %span.end(),
            count,
            "resolved history query"
        );
        if count > i64::from(max_buckets) {
            return Err(HistoryError::TooManyBuckets {
                count,
                max: max_buckets,
            });
        }
        Ok(query)
    }
}

async fn project(state: &AppState, slug: &str) -> Result<Project, HistoryError> {
    state
        .repo
        .find_project(slug)
        .await?
        .ok_or_else(|| HistoryError::ProjectNotFound(slug.to_string()))
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /{project}/api/api_requests/history
pub(super) async fn request_history_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse<i64>>, HistoryError> {
    let project = project(&state, &slug).await?;
    let query = params.bucket_query(&project, state.config.history.max_buckets)?;
    let group_by = GroupBy::parse(params.group_by.as_deref());
    let data = history::request_history(state.repo.as_ref(), &query, group_by).await?;
    Ok(Json(HistoryResponse {
        data,
        meta: query.span.meta(),
    }))
}

/// GET /{project}/api/api_requests/latency_history
pub(super) async fn latency_history_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse<f64>>, HistoryError> {
    let project = project(&state, &slug).await?;
    let query = params.bucket_query(&project, state.config.history.max_buckets)?;
    let data = history::latency_history(state.repo.as_ref(), &query).await?;
    Ok(Json(HistoryResponse {
        data,
        meta: query.span.meta(),
    }))
}

/// GET /{project}/api/background_jobs/history
pub(super) async fn job_history_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse<i64>>, HistoryError> {
    let project = project(&state, &slug).await?;
    let query = params.bucket_query(&project, state.config.history.max_buckets)?;
    let data = history::job_history(state.repo.as_ref(), &query).await?;
    Ok(Json(HistoryResponse {
        data,
        meta: query.span.meta(),
    }))
}

/// GET /{project}/api/host_metrics
pub(super) async fn host_metrics_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<MetricsPage>, HistoryError> {
    let project = project(&state, &slug).await?;
    let span = params.span()?;
    let cfg = &state.config.history;
    let page = PageParams::from_params(
        params.page.as_deref(),
        params.per_page.as_deref(),
        cfg.default_per_page,
        cfg.max_per_page,
    );
    let min_spacing = downsample::parse_min_spacing(params.min_sample_spacing.as_deref());
    let (data, record_count) = downsample::list_host_metrics(
        state.repo.as_ref(),
        project.id,
        &span,
        min_spacing,
        cfg.native_sample_spacing_secs,
        page,
    )
    .await?;
    Ok(Json(MetricsPage {
        data,
        meta: PageMeta {
            pagination: Pagination::new(page, record_count),
            span: span.meta(),
        },
    }))
}
