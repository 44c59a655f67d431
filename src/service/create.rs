//! Table creation handler.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use super::{run_blocking, ApiError, QueryParams};
use crate::server::ServerState;
use crate::storage::schema::ColumnDef;

/// Handle `GET /create?table=T&col=name+TYPE&col=...`.
///
/// Runs under the write lock, so it never interleaves with a job or a
/// cleanup cycle.
#[tracing::instrument(skip(state, pairs), fields(table))]
pub async fn handle_create(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = QueryParams::new(pairs);
    let table = params
        .first("table")
        .ok_or_else(|| ApiError::BadRequest("missing table".into()))?
        .to_string();
    tracing::Span::current().record("table", table.as_str());

    let columns = params
        .all("col")
        .iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| ColumnDef::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let lock = state.lock.clone();
    let name = table.clone();
    run_blocking(move || Ok(lock.with(|store| store.create_table(&name, &columns))?)).await?;

    tracing::info!("Table created");
    Ok((StatusCode::CREATED, Json(json!({ "table": table }))))
}
