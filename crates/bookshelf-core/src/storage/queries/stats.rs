use rusqlite::{params, Connection};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::{BookStatus, MonthlyStats, OverallStats, Statistics};

/// Number of most recent months reported in `Statistics::monthly`.
pub const MONTHLY_WINDOW: usize = 12;

pub struct ReadingStatsQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> ReadingStatsQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    pub fn statistics(&self) -> Result<Statistics> {
        Ok(Statistics {
            overall: self.overall()?,
            monthly: self.monthly(MONTHLY_WINDOW)?,
        })
    }

    /// Totals over the whole collection. `total_pages` only counts read books;
    /// `avg_rating` averages every rated book and is 0 when none are rated.
    pub fn overall(&self) -> Result<OverallStats> {
        let stats = self.conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN status = 'read' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'wishlist' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'read' THEN COALESCE(pages, 0) ELSE 0 END), 0),
                COALESCE(AVG(rating), 0.0)
             FROM books",
            [],
            |row| {
                Ok(OverallStats {
                    total_read: row.get::<_, i64>(0)? as u64,
                    total_wishlist: row.get::<_, i64>(1)? as u64,
                    total_pages: row.get::<_, i64>(2)? as u64,
                    avg_rating: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Read books bucketed by the month they were added, newest month first.
    pub fn monthly(&self, limit: usize) -> Result<Vec<MonthlyStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                CAST(strftime('%Y', created_at) AS INTEGER) AS year,
                CAST(strftime('%m', created_at) AS INTEGER) AS month,
                COUNT(*),
                COALESCE(SUM(pages), 0)
             FROM books
             WHERE status = ?1
             GROUP BY year, month
             ORDER BY year DESC, month DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![BookStatus::Read.as_str(), limit as i64], |row| {
                Ok(MonthlyStats {
                    year: row.get(0)?,
                    month: row.get(1)?,
                    books_count: row.get::<_, i64>(2)? as u64,
                    pages_count: row.get::<_, i64>(3)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
