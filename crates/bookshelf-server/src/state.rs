use std::sync::Arc;

use bookshelf_core::config::LibraryConfig;
use bookshelf_core::{AppConfig, Database};
use bookshelf_lookup::{CatalogSource, OpenLibrarySource};

/// Shared state handed to every handler.
pub struct AppState {
    pub db: Database,
    pub catalog: Arc<dyn CatalogSource>,
    pub library: LibraryConfig,
    pub max_search_results: usize,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, catalog: Arc<dyn CatalogSource>, config: &AppConfig) -> Self {
        Self {
            db,
            catalog,
            library: config.library.clone(),
            max_search_results: config.lookup.max_results,
        }
    }

    /// Opens the configured database and wires the Open Library source.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let db = Database::open(&config.database_path())?;
        let catalog = OpenLibrarySource::from_config(&config.lookup, config.cache_dir())?;
        tracing::info!(database = %config.database_path().display(), "database opened");
        Ok(Self::new(db, Arc::new(catalog), config))
    }
}
