mod status;

pub use status::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BookshelfError, Result};

/// Highest rating a book can carry.
pub const MAX_RATING: f64 = 5.0;

/// A catalog entry as stored and served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cover_url: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub pages: Option<u32>,
    /// Always filled in by this backend; other backends may leave them out.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_read(&self) -> bool {
        self.status == BookStatus::Read
    }

    /// The editable part of the book, as sent back on update.
    pub fn to_new_book(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            status: self.status,
            cover_url: self.cover_url.clone(),
            year: self.year,
            rating: self.rating,
            pages: self.pages,
        }
    }

    pub fn apply(&mut self, changes: NewBook) {
        self.title = changes.title;
        self.author = changes.author;
        self.status = changes.status;
        self.cover_url = changes.cover_url;
        self.year = changes.year;
        self.rating = changes.rating;
        self.pages = changes.pages;
    }
}

/// Body of `POST /books`: a book without id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cover_url: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: BookStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = cover_url.into();
        self
    }

    /// Trims text fields and checks the entry can be stored.
    ///
    /// A rating of zero means "unrated" and is stored as absent.
    pub fn validated(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.cover_url = self.cover_url.trim().to_string();

        if self.title.is_empty() {
            return Err(BookshelfError::ValidationError("title is required".into()));
        }
        if self.author.is_empty() {
            return Err(BookshelfError::ValidationError("author is required".into()));
        }
        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
                return Err(BookshelfError::ValidationError(format!(
                    "rating must be between 0 and {MAX_RATING}, got {rating}"
                )));
            }
            if rating == 0.0 {
                self.rating = None;
            }
        }
        Ok(self)
    }
}

/// Body of `PUT /books`: the full book. Timestamps, if present, are ignored.
///
/// Unlike [`NewBook`], `status` and `cover_url` have no defaults, so a
/// partial body is rejected instead of resetting the stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub id: i64,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    pub status: BookStatus,
    #[serde(deserialize_with = "null_as_empty")]
    pub cover_url: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl BookUpdate {
    /// The editable fields, in the shape `NewBook::validated` checks.
    pub fn changes(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            status: self.status,
            cover_url: self.cover_url.clone(),
            year: self.year,
            rating: self.rating,
            pages: self.pages,
        }
    }
}

impl From<&Book> for BookUpdate {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            status: book.status,
            cover_url: book.cover_url.clone(),
            year: book.year,
            rating: book.rating,
            pages: book.pages,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_defaults_to_wishlist() {
        let book: NewBook =
            serde_json::from_str(r#"{"title": "Dune", "author": "Frank Herbert"}"#).unwrap();
        assert_eq!(book.status, BookStatus::Wishlist);
        assert!(book.cover_url.is_empty());
        assert_eq!(book.pages, None);
    }

    #[test]
    fn test_null_cover_is_empty() {
        let book: NewBook = serde_json::from_str(
            r#"{"title": "Dune", "author": "Frank Herbert", "cover_url": null, "rating": 4}"#,
        )
        .unwrap();
        assert!(book.cover_url.is_empty());
        assert_eq!(book.rating, Some(4.0));
    }

    #[test]
    fn test_validated_trims_and_rejects_empty() {
        let book = NewBook::new("  Dune ", " Frank Herbert").validated().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");

        let err = NewBook::new("   ", "Someone").validated().unwrap_err();
        assert!(err.to_string().contains("title"));
        let err = NewBook::new("Title", "").validated().unwrap_err();
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_validated_rating_bounds() {
        assert!(NewBook::new("A", "B").with_rating(5.5).validated().is_err());
        assert!(NewBook::new("A", "B").with_rating(-1.0).validated().is_err());
        assert!(NewBook::new("A", "B").with_rating(f64::NAN).validated().is_err());

        let zero = NewBook::new("A", "B").with_rating(0.0).validated().unwrap();
        assert_eq!(zero.rating, None);
        let ok = NewBook::new("A", "B").with_rating(3.5).validated().unwrap();
        assert_eq!(ok.rating, Some(3.5));
    }

    #[test]
    fn test_update_ignores_timestamps() {
        let update: BookUpdate = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Solaris",
                "author": "Stanisław Lem",
                "status": "read",
                "cover_url": "https://example.com/solaris.jpg",
                "pages": 204,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(update.id, 3);
        assert_eq!(update.status, BookStatus::Read);
        assert_eq!(update.changes().pages, Some(204));
    }

    #[test]
    fn test_update_requires_status_and_cover() {
        let missing_status = serde_json::from_str::<BookUpdate>(
            r#"{"id": 1, "title": "Dune", "author": "Herbert", "cover_url": "c"}"#,
        );
        assert!(missing_status.unwrap_err().to_string().contains("status"));

        let missing_cover = serde_json::from_str::<BookUpdate>(
            r#"{"id": 1, "title": "Dune", "author": "Herbert", "status": "read"}"#,
        );
        assert!(missing_cover.unwrap_err().to_string().contains("cover_url"));

        let null_cover: BookUpdate = serde_json::from_str(
            r#"{"id": 1, "title": "Dune", "author": "Herbert", "status": "read", "cover_url": null}"#,
        )
        .unwrap();
        assert!(null_cover.cover_url.is_empty());
        assert_eq!(null_cover.pages, None);
    }

    #[test]
    fn test_book_without_timestamps() {
        let book: Book = serde_json::from_str(
            r#"{"id": 1, "title": "A", "author": "B", "status": "read", "cover_url": "x"}"#,
        )
        .unwrap();
        assert_eq!(book.created_at, None);
        assert_eq!(book.updated_at, None);
        assert!(book.is_read());
    }
}
