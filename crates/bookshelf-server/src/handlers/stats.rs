use axum::{extract::State, Json};

use bookshelf_core::Statistics;

use super::with_db;
use crate::error::ApiError;
use crate::state::SharedState;

/// `GET /stats`
pub async fn get_statistics(State(state): State<SharedState>) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(with_db(&state, |db| db.statistics()).await?))
}
