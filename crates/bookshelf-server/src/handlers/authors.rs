use axum::{extract::State, Json};

use bookshelf_core::AuthorSummary;

use super::with_db;
use crate::error::ApiError;
use crate::state::SharedState;

/// `GET /authors`
pub async fn list_authors(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AuthorSummary>>, ApiError> {
    Ok(Json(with_db(&state, |db| db.authors()).await?))
}
