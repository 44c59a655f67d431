//! Insert handler: validates a write and hands it to the job queue.
//!
//! The caller only learns whether the job was accepted. Execution failures
//! are logged by the worker.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, QueryParams};
use crate::queue::Job;
use crate::server::ServerState;

/// JSON body for `POST /insert`.
#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Response for an accepted job.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertResponse {
    pub job_id: String,
    pub status: String,
}

/// Handle `GET /insert?table=T&val=..[&col=..]`.
pub async fn handle_insert_query(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = QueryParams::new(pairs);
    let request = InsertRequest {
        table: params.first("table").unwrap_or_default().to_string(),
        columns: params.all("col"),
        values: params.all("val"),
    };
    enqueue(&state, request).await
}

/// Handle `POST /insert` with a JSON body.
pub async fn handle_insert_json(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<InsertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    enqueue(&state, request).await
}

#[tracing::instrument(skip(state, request), fields(table = %request.table, job_id))]
async fn enqueue(
    state: &Arc<ServerState>,
    request: InsertRequest,
) -> Result<(StatusCode, Json<InsertResponse>), ApiError> {
    let job = Job::new(request.table, request.columns, request.values)?;
    let accepted = state.queue.submit(job).await?;

    tracing::Span::current().record("job_id", accepted.job_id.as_str());
    tracing::debug!("Job queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(InsertResponse {
            job_id: accepted.job_id,
            status: "queued".to_string(),
        }),
    ))
}
