use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/bookshelf/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub lookup: LookupConfig,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,

    /// Per-endpoint URLs; anything missing is derived from `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_search_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub openlibrary_url: String,
    pub max_results: usize,
    pub cache_ttl_secs: u64,
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Cover used when a new book arrives without one.
    pub default_cover_url: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("bookshelf");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 15,
            books_url: None,
            stats_url: None,
            authors_url: None,
            book_search_url: None,
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            openlibrary_url: "https://openlibrary.org".to_string(),
            max_results: 10,
            cache_ttl_secs: 7 * 24 * 60 * 60,
            min_interval_ms: 500,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_cover_url:
                "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?w=400&h=600&fit=crop"
                    .to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/bookshelf/config.toml`,
    /// or `BOOKSHELF_CONFIG` when set.
    pub fn config_path() -> PathBuf {
        Self::resolve_config_path(std::env::var_os("BOOKSHELF_CONFIG").map(PathBuf::from))
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
            return path;
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bookshelf")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't
    /// exist. `BOOKSHELF_DATA_DIR` overrides the data directory.
    pub fn load() -> Result<Self> {
        Self::load_with_data_dir(&Self::config_path(), std::env::var("BOOKSHELF_DATA_DIR").ok())
    }

    fn load_with_data_dir(path: &Path, data_dir: Option<String>) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            config.core.data_dir = dir;
        }
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    // ─── Derived values ────────────────────────────────────

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir).join("db").join("bookshelf.db")
    }

    /// Directory for cached catalog lookups.
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir).join("cache")
    }

    /// `host:port` the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Flat `key = value` listing used by `bookshelf config list`.
    pub fn key_values(&self) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        map.insert("core.data_dir", self.core.data_dir.clone());
        map.insert("core.database_path", self.database_path().to_string_lossy().to_string());
        map.insert("server.host", self.server.host.clone());
        map.insert("server.port", self.server.port.to_string());
        map.insert("client.base_url", self.client.base_url.clone());
        map.insert("client.timeout_secs", self.client.timeout_secs.to_string());
        map.insert("lookup.openlibrary_url", self.lookup.openlibrary_url.clone());
        map.insert("lookup.max_results", self.lookup.max_results.to_string());
        map.insert("library.default_cover_url", self.library.default_cover_url.clone());
        map
    }
}
