use serde::{Deserialize, Serialize};

/// A search hit from an external catalog, used to prefill a new entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub isbn: Option<String>,
}

impl CatalogBook {
    pub fn into_new_book(self) -> super::NewBook {
        super::NewBook {
            title: self.title,
            author: self.author,
            cover_url: self.cover.unwrap_or_default(),
            year: self.year,
            pages: self.pages,
            ..super::NewBook::default()
        }
    }
}

/// Payload of `GET /book-search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSearchResponse {
    pub books: Vec<CatalogBook>,
    pub total: usize,
}

impl From<Vec<CatalogBook>> for CatalogSearchResponse {
    fn from(books: Vec<CatalogBook>) -> Self {
        let total = books.len();
        Self { books, total }
    }
}
