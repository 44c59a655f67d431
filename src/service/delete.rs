//! Synchronous row deletion under the write lock.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use super::{run_blocking, ApiError, QueryParams};
use crate::server::ServerState;
use crate::storage::schema::{quote_identifier, validate_identifier};
use crate::storage::Store;

/// Handle `GET|DELETE /delete?table=T&col=C&val=V`.
#[tracing::instrument(skip(state, pairs), fields(table, rows_deleted))]
pub async fn handle_delete(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = QueryParams::new(pairs);
    let (Some(table), Some(column), Some(value)) =
        (params.first("table"), params.first("col"), params.first("val"))
    else {
        return Err(ApiError::BadRequest("table, col and val are required".into()));
    };
    validate_identifier(table)?;
    validate_identifier(column)?;
    tracing::Span::current().record("table", table);

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_identifier(table),
        quote_identifier(column)
    );
    let args = vec![value.to_string()];
    let lock = state.lock.clone();
    let deleted = run_blocking(move || Ok(lock.with(|store| store.execute(&sql, &args))?)).await?;

    tracing::Span::current().record("rows_deleted", deleted as u64);
    tracing::info!("Rows deleted");
    Ok(Json(json!({ "deleted": deleted })))
}
