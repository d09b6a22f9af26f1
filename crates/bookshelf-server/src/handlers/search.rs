use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use bookshelf_core::CatalogSearchResponse;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /book-search?q=<query>`
pub async fn search_catalog(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CatalogSearchResponse>, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("Query parameter \"q\" is required".into()));
    }

    let books = state.catalog.search(q, state.max_search_results).await?;
    tracing::debug!(source = state.catalog.name(), query = q, hits = books.len(), "catalog search");
    Ok(Json(CatalogSearchResponse::from(books)))
}
