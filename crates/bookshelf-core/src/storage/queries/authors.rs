use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::AuthorSummary;

/// Builds the author index: one entry per distinct `author` string.
pub struct AuthorIndexQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> AuthorIndexQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    /// Titles within an entry are newest first. Entries are ordered by book
    /// count, then pages, then name.
    pub fn authors(&self) -> Result<Vec<AuthorSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT author, title, pages FROM books ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<u32>>(2)?,
            ))
        })?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut authors: Vec<AuthorSummary> = Vec::new();
        for row in rows {
            let (name, title, pages) = row?;
            let slot = *index.entry(name.clone()).or_insert_with(|| {
                authors.push(AuthorSummary {
                    name,
                    ..AuthorSummary::default()
                });
                authors.len() - 1
            });

            let entry = &mut authors[slot];
            entry.books_count += 1;
            entry.pages_read += u64::from(pages.unwrap_or(0));
            entry.books.push(title);
        }

        authors.sort_by(|a, b| {
            b.books_count
                .cmp(&a.books_count)
                .then_with(|| b.pages_read.cmp(&a.pages_read))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(authors)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::models::{BookStatus, NewBook};
    use crate::storage::database::Database;

    #[test]
    fn test_author_index() {
        let db = Database::open_in_memory().unwrap();
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 8, 0, 0).unwrap();

        db.create_book_at(&NewBook::new("War and Peace", "Tolstoy").with_pages(1225), day(1))
            .unwrap();
        db.create_book_at(
            &NewBook::new("Anna Karenina", "Tolstoy").with_status(BookStatus::Read).with_pages(864),
            day(2),
        )
        .unwrap();
        db.create_book_at(&NewBook::new("Crime and Punishment", "Dostoevsky").with_pages(671), day(3))
            .unwrap();
        db.create_book_at(&NewBook::new("Short", "Chekhov").with_pages(80), day(4))
            .unwrap();
        db.create_book_at(&NewBook::new("Untitled", "Anonymous"), day(5)).unwrap();

        let authors = db.authors().unwrap();
        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Tolstoy", "Dostoevsky", "Chekhov", "Anonymous"]);

        let tolstoy = &authors[0];
        assert_eq!(tolstoy.books_count, 2);
        assert_eq!(tolstoy.pages_read, 1225 + 864);
        assert_eq!(tolstoy.books, vec!["Anna Karenina", "War and Peace"]);

        assert_eq!(authors[3].pages_read, 0);
    }

    #[test]
    fn test_author_index_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.authors().unwrap().is_empty());
    }
}
