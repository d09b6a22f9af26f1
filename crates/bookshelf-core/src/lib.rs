pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod storage;

pub use config::AppConfig;
pub use error::{BookshelfError, ExitCode, Result};
pub use models::*;

pub use insights::{BookFilter, LibrarySummary, MonthlyTrend, RatingBucket};
pub use storage::database::{open_database, open_in_memory, ConnectionPool, Database};
pub use storage::queries::{AuthorIndexQuery, ReadingStatsQuery};
pub use storage::repositories::{BookRepository, Repository, SqliteBookRepository};
