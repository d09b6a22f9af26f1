use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use bookshelf_core::{Book, BookStatus, BookUpdate, NewBook};

use super::with_db;
use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct BooksQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<BookStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid status: {s}"))),
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// `GET /books?status=<read|wishlist>`
pub async fn list_books(
    State(state): State<SharedState>,
    Query(query): Query<BooksQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let status = parse_status(query.status.as_deref())?;
    let books = with_db(&state, move |db| db.list_books(status)).await?;
    tracing::debug!(?status, count = books.len(), "listed books");
    Ok(Json(books))
}

/// `POST /books`
pub async fn create_book(
    State(state): State<SharedState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let mut new_book = body(payload)?;
    if new_book.cover_url.trim().is_empty() {
        new_book.cover_url = state.library.default_cover_url.clone();
    }

    let book = with_db(&state, move |db| db.create_book(&new_book)).await?;
    tracing::info!(id = book.id, title = %book.title, status = %book.status, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// `PUT /books`
pub async fn update_book(
    State(state): State<SharedState>,
    payload: Result<Json<BookUpdate>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let update = body(payload)?;
    let book = with_db(&state, move |db| db.update_book(&update)).await?;
    tracing::info!(id = book.id, status = %book.status, "book updated");
    Ok(Json(book))
}

/// `DELETE /books?id=<id>`
pub async fn delete_book(
    State(state): State<SharedState>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let raw = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Query parameter \"id\" is required".into()))?;
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid book id: {raw}")))?;

    with_db(&state, move |db| db.delete_book(id)).await?;
    tracing::info!(id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
