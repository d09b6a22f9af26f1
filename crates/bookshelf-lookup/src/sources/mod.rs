use async_trait::async_trait;

use bookshelf_core::CatalogBook;

use crate::error::Result;

pub mod openlibrary;

/// A remote catalog that can suggest books for a free-text query.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogBook>>;
}
