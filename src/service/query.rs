//! Read handler backed by the reader pool.
//!
//! Reads bypass the write lock. SQLite's WAL mode gives them a consistent
//! snapshot while the worker writes.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use super::{run_blocking, ApiError, QueryParams};
use crate::server::ServerState;
use crate::storage::reader::RowFilter;

/// Handle `GET /query?table=T[&col=C&val=V]`.
#[tracing::instrument(skip(state, pairs))]
pub async fn handle_query(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = QueryParams::new(pairs);
    let table = params
        .first("table")
        .ok_or_else(|| ApiError::BadRequest("missing table".into()))?
        .to_string();
    let filter = match (params.first("col"), params.first("val")) {
        (Some(column), Some(value)) => Some(RowFilter {
            column: column.to_string(),
            value: value.to_string(),
        }),
        (None, None) => None,
        _ => return Err(ApiError::BadRequest("col and val must be given together".into())),
    };

    let rows =
        run_blocking(move || Ok(state.reader_pool.select_rows(&table, filter.as_ref())?)).await?;
    Ok(Json(rows))
}
