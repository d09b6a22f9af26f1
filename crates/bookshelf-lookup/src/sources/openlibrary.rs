use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use bookshelf_core::CatalogBook;
use bookshelf_core::config::LookupConfig;

use crate::error::{LookupError, Result};
use crate::http::{DiskCache, RateLimitedClient};
use crate::sources::CatalogSource;

const USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Maps one `search.json` doc to a catalog entry.
pub fn book_from_doc(doc: &Value) -> CatalogBook {
    let title = doc
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED)
        .to_string();

    let authors = doc
        .get("author_name")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    let author = if authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        authors.join(", ")
    };

    let cover = doc
        .get("cover_i")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .map(|id| format!("https://covers.openlibrary.org/b/id/{id}-L.jpg"));

    let isbn = doc
        .get("isbn")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    CatalogBook {
        title,
        author,
        year: doc
            .get("first_publish_year")
            .and_then(Value::as_i64)
            .and_then(|y| i32::try_from(y).ok()),
        cover,
        pages: doc
            .get("number_of_pages_median")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok()),
        isbn,
    }
}

pub struct OpenLibrarySource {
    client: RateLimitedClient,
    cache: DiskCache,
    base_url: String,
}

impl OpenLibrarySource {
    /// Source configured from the `[lookup]` section, caching under `cache_dir`.
    pub fn from_config(config: &LookupConfig, cache_dir: PathBuf) -> Result<Self> {
        Self::with_config(
            config.openlibrary_url.clone(),
            Duration::from_millis(config.min_interval_ms),
            DiskCache::new(
                cache_dir.join("openlibrary"),
                Duration::from_secs(config.cache_ttl_secs),
            ),
        )
    }

    fn with_config(base_url: String, min_interval: Duration, cache: DiskCache) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, USER_AGENT)?,
            cache,
            base_url,
        })
    }

    pub async fn search_books(&self, query: &str, limit: usize) -> Result<Vec<CatalogBook>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        let cache_key = format!("search:{limit}:{}", query.to_lowercase());
        if let Some(cached) = self.cache.get::<Vec<CatalogBook>>(&cache_key).await {
            tracing::debug!(query, "catalog search served from cache");
            return Ok(cached);
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LookupError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::Parse("invalid Open Library base URL".to_string()))?
            .pop_if_empty()
            .push("search.json");
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());

        let json: Value = self.client.get_json(url.as_str()).await?;
        let books = json
            .get("docs")
            .and_then(Value::as_array)
            .map(|docs| docs.iter().take(limit).map(book_from_doc).collect::<Vec<_>>())
            .unwrap_or_default();

        tracing::info!(query, hits = books.len(), "catalog search");
        self.cache.set(&cache_key, &books).await;
        Ok(books)
    }
}

#[async_trait]
impl CatalogSource for OpenLibrarySource {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogBook>> {
        self.search_books(query, limit).await
    }
}
