//! Route handlers. Each endpoint mirrors one resource of the public API.

mod authors;
mod books;
mod search;
mod stats;

pub use authors::list_authors;
pub use books::{create_book, delete_book, list_books, update_book, BooksQuery, DeleteQuery};
pub use search::{search_catalog, SearchQuery};
pub use stats::get_statistics;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use bookshelf_core::Database;

use crate::error::ApiError;
use crate::state::SharedState;

/// Runs a synchronous SQLite call on the blocking pool.
pub(crate) async fn with_db<T, F>(state: &SharedState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> bookshelf_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let books = with_db(&state, |db| db.count_books()).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "books": books,
    })))
}
