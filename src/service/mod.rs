//! HTTP handlers for Datasilo.
//!
//! Routes take their arguments from the query string (repeated keys such as
//! `col=a&col=b` are preserved in order); `/insert` also accepts a JSON body.

pub mod create;
pub mod delete;
pub mod error;
pub mod insert;
pub mod params;
pub mod query;

pub use error::ApiError;
pub use params::QueryParams;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::server::ServerState;

/// Build the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/create", get(create::handle_create))
        .route(
            "/insert",
            get(insert::handle_insert_query).post(insert::handle_insert_json),
        )
        .route("/query", get(query::handle_query))
        .route(
            "/delete",
            get(delete::handle_delete).delete(delete::handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run blocking store work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}
