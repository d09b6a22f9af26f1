//! Bookshelf Client: typed access to the books, stats, authors and catalog
//! endpoints. Each endpoint has its own URL so they can live on different
//! hosts.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use reqwest::StatusCode;

use bookshelf_core::config::ClientConfig;
use bookshelf_core::{
    AuthorSummary, Book, BookStatus, BookUpdate, CatalogSearchResponse, NewBook, Statistics,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to {operation} (HTTP {})", .status.as_u16())]
    Status {
        operation: &'static str,
        status: StatusCode,
    },
}

impl ClientError {
    /// HTTP status returned by the server, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::InvalidUrl { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

// ─── Endpoints ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub books: Url,
    pub stats: Url,
    pub authors: Url,
    pub book_search: Url,
}

impl ApiEndpoints {
    /// `http://host:port` becomes `http://host:port/books`, `/stats` and so on.
    pub fn from_base(base: &str) -> Result<Self> {
        let base = base.trim().trim_end_matches('/');
        Ok(Self {
            books: parse_url(&format!("{base}/books"))?,
            stats: parse_url(&format!("{base}/stats"))?,
            authors: parse_url(&format!("{base}/authors"))?,
            book_search: parse_url(&format!("{base}/book-search"))?,
        })
    }

    /// Base-derived URLs, overridden by any explicitly configured endpoint.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut endpoints = Self::from_base(&config.base_url)?;
        let overrides = [
            (&config.books_url, &mut endpoints.books),
            (&config.stats_url, &mut endpoints.stats),
            (&config.authors_url, &mut endpoints.authors),
            (&config.book_search_url, &mut endpoints.book_search),
        ];
        for (configured, slot) in overrides {
            if let Some(raw) = configured.as_deref().filter(|s| !s.trim().is_empty()) {
                *slot = parse_url(raw)?;
            }
        }
        Ok(endpoints)
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct BookshelfClient {
    http: reqwest::Client,
    endpoints: ApiEndpoints,
}

impl BookshelfClient {
    pub fn new(endpoints: ApiEndpoints, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoints })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            ApiEndpoints::from_config(config)?,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// `GET /books`, optionally narrowed to one status.
    pub async fn list_books(&self, status: Option<BookStatus>) -> Result<Vec<Book>> {
        let mut request = self.http.get(self.endpoints.books.clone());
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        let resp = request.send().await?;
        decode(resp, "fetch books").await
    }

    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let resp = self
            .http
            .post(self.endpoints.books.clone())
            .json(book)
            .send()
            .await?;
        decode(resp, "create book").await
    }

    pub async fn update_book(&self, book: &Book) -> Result<Book> {
        let resp = self
            .http
            .put(self.endpoints.books.clone())
            .json(&BookUpdate::from(book))
            .send()
            .await?;
        decode(resp, "update book").await
    }

    pub async fn delete_book(&self, id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(self.endpoints.books.clone())
            .query(&[("id", id)])
            .send()
            .await?;
        check(resp, "delete book").await?;
        Ok(())
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let resp = self.http.get(self.endpoints.stats.clone()).send().await?;
        decode(resp, "fetch statistics").await
    }

    pub async fn authors(&self) -> Result<Vec<AuthorSummary>> {
        let resp = self.http.get(self.endpoints.authors.clone()).send().await?;
        decode(resp, "fetch authors").await
    }

    /// Looks the query up in the external catalog through the backend.
    pub async fn search_catalog(&self, query: &str) -> Result<CatalogSearchResponse> {
        let resp = self
            .http
            .get(self.endpoints.book_search.clone())
            .query(&[("q", query)])
            .send()
            .await?;
        decode(resp, "search catalog").await
    }
}

async fn check(resp: Response, operation: &'static str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(operation, %status, body = %body, "request rejected");
    Err(ClientError::Status { operation, status })
}

async fn decode<T: DeserializeOwned>(resp: Response, operation: &'static str) -> Result<T> {
    Ok(check(resp, operation).await?.json().await?)
}
