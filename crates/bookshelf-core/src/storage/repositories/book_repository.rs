use std::sync::MutexGuard;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BookshelfError, Result};
use crate::models::{Book, BookStatus, NewBook};

use super::Repository;

const BOOK_COLUMNS: &str =
    "id, title, author, status, cover_url, year, rating, pages, created_at, updated_at";

pub trait BookRepository: Repository<Entity = Book, Id = i64> {
    fn insert(&self, book: &NewBook, now: DateTime<Utc>) -> Result<Book>;
    fn update(&self, id: i64, changes: &NewBook, now: DateTime<Utc>) -> Result<Book>;
    fn list(&self, status: Option<BookStatus>) -> Result<Vec<Book>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteBookRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        let status: String = row.get(3)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            status: status.parse().map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Text,
                    Box::new(BookshelfError::InvalidStatus(status.clone())),
                )
            })?,
            cover_url: row.get(4)?,
            year: row.get(5)?,
            rating: row.get(6)?,
            pages: row.get(7)?,
            created_at: Some(parse_timestamp(8, &created_at)?),
            updated_at: Some(parse_timestamp(9, &updated_at)?),
        })
    }
}

/// Timestamps are stored as `YYYY-MM-DDTHH:MM:SSZ` so SQLite date functions
/// and lexical ordering both work on them.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(BookshelfError::InvalidTimestamp(raw.to_string())),
            )
        })
}

impl<'a> Repository for SqliteBookRepository<'a> {
    type Entity = Book;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                params![id],
                Self::row_to_book,
            )
            .optional()?;
        Ok(book)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> BookRepository for SqliteBookRepository<'a> {
    fn insert(&self, book: &NewBook, now: DateTime<Utc>) -> Result<Book> {
        let stamp = format_timestamp(now);
        self.conn.execute(
            "INSERT INTO books
                (title, author, status, cover_url, year, rating, pages, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                book.title,
                book.author,
                book.status.as_str(),
                book.cover_url,
                book.year,
                book.rating,
                book.pages,
                stamp,
                stamp,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(&id)?.ok_or(BookshelfError::BookNotFound(id))
    }

    fn update(&self, id: i64, changes: &NewBook, now: DateTime<Utc>) -> Result<Book> {
        let changed = self.conn.execute(
            "UPDATE books
             SET title = ?1, author = ?2, status = ?3, cover_url = ?4,
                 year = ?5, rating = ?6, pages = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                changes.title,
                changes.author,
                changes.status.as_str(),
                changes.cover_url,
                changes.year,
                changes.rating,
                changes.pages,
                format_timestamp(now),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(BookshelfError::BookNotFound(id));
        }
        self.find_by_id(&id)?.ok_or(BookshelfError::BookNotFound(id))
    }

    fn list(&self, status: Option<BookStatus>) -> Result<Vec<Book>> {
        let rows = match status {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {BOOK_COLUMNS} FROM books WHERE status = ?1
                     ORDER BY created_at DESC, id DESC"
                ))?;
                stmt.query_map(params![status.as_str()], Self::row_to_book)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, id DESC"
                ))?;
                stmt.query_map([], Self::row_to_book)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
