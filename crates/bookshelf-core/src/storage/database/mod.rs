mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::{init_schema, SCHEMA_VERSION};

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{BookshelfError, Result};
use crate::models::{AuthorSummary, Book, BookStatus, BookUpdate, NewBook, Statistics};

use super::queries::{AuthorIndexQuery, ReadingStatsQuery};
use super::repositories::{BookRepository, Repository, SqliteBookRepository};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// Entry point for everything the backend serves.
///
/// Input books are validated here, so every caller (HTTP handlers, CLI,
/// tests) gets the same rules.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }

    pub fn list_books(&self, status: Option<BookStatus>) -> Result<Vec<Book>> {
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        repo.list(status)
    }

    pub fn get_book(&self, id: i64) -> Result<Book> {
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        repo.find_by_id(&id)?.ok_or(BookshelfError::BookNotFound(id))
    }

    pub fn create_book(&self, book: &NewBook) -> Result<Book> {
        self.create_book_at(book, Utc::now())
    }

    /// Creates a book with an explicit creation time, used by imports and
    /// tests that need books in past months.
    pub fn create_book_at(&self, book: &NewBook, created_at: DateTime<Utc>) -> Result<Book> {
        let book = book.clone().validated()?;
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        repo.insert(&book, created_at)
    }

    pub fn update_book(&self, update: &BookUpdate) -> Result<Book> {
        let changes = update.changes().validated()?;
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        repo.update(update.id, &changes, Utc::now())
    }

    pub fn delete_book(&self, id: i64) -> Result<()> {
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        if !repo.delete(&id)? {
            return Err(BookshelfError::BookNotFound(id));
        }
        Ok(())
    }

    pub fn count_books(&self) -> Result<usize> {
        let repo = SqliteBookRepository::new(self.pool.get_connection());
        repo.count()
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let query = ReadingStatsQuery::new(self.pool.get_connection());
        query.statistics()
    }

    pub fn authors(&self) -> Result<Vec<AuthorSummary>> {
        let query = AuthorIndexQuery::new(self.pool.get_connection());
        query.authors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_on_disk_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("bookshelf.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_book(&NewBook::new("Persisted", "Author")).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_books().unwrap(), 1);
        assert_eq!(db.path(), Some(path.to_string_lossy().as_ref()));
    }

    #[test]
    fn test_create_validates() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_book(&NewBook::new("", "Author")).unwrap_err();
        assert!(matches!(err, BookshelfError::ValidationError(_)));
        assert_eq!(db.count_books().unwrap(), 0);
    }

    #[test]
    fn test_get_update_delete() {
        let db = Database::open_in_memory().unwrap();
        let book = db.create_book(&NewBook::new("Roadside Picnic", "Strugatsky")).unwrap();
        assert_eq!(book.status, BookStatus::Wishlist);

        let mut update = BookUpdate::from(&book);
        update.status = BookStatus::Read;
        update.rating = Some(0.0);
        let updated = db.update_book(&update).unwrap();
        assert_eq!(updated.status, BookStatus::Read);
        assert_eq!(updated.rating, None);
        assert_eq!(db.get_book(book.id).unwrap(), updated);

        db.delete_book(book.id).unwrap();
        assert!(matches!(db.get_book(book.id), Err(BookshelfError::BookNotFound(_))));
        assert!(matches!(db.delete_book(book.id), Err(BookshelfError::BookNotFound(_))));
    }
}
