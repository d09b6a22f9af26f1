//! Values derived on the client from lists the backend returns.
//!
//! Everything here is a pure function over a slice; callers recompute on each
//! render instead of caching.

use serde::{Deserialize, Serialize};

use crate::models::{AuthorSummary, Book, BookStatus, MonthlyStats, OverallStats};

/// Totals shown above the book grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub total_read: usize,
    pub total_wishlist: usize,
    pub total_pages: u64,
    pub avg_rating: f64,
}

impl LibrarySummary {
    pub fn from_books(books: &[Book]) -> Self {
        let mut summary = Self::default();
        let mut rating_sum = 0.0;
        let mut rated = 0usize;

        for book in books {
            match book.status {
                BookStatus::Read => {
                    summary.total_read += 1;
                    summary.total_pages += u64::from(book.pages.unwrap_or(0));
                }
                BookStatus::Wishlist => summary.total_wishlist += 1,
            }
            if let Some(rating) = book.rating {
                rating_sum += rating;
                rated += 1;
            }
        }

        if rated > 0 {
            summary.avg_rating = rating_sum / rated as f64;
        }
        summary
    }
}

/// Rating filter tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBucket {
    /// 4 and above.
    High,
    /// From 2.5 up to, not including, 4.
    Medium,
    /// Above 0 and below 2.5.
    Low,
    /// No rating, or a rating of 0.
    Unrated,
}

impl RatingBucket {
    pub fn of(rating: Option<f64>) -> Self {
        match rating {
            Some(r) if r >= 4.0 => Self::High,
            Some(r) if r >= 2.5 => Self::Medium,
            Some(r) if r > 0.0 => Self::Low,
            _ => Self::Unrated,
        }
    }
}

impl std::fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unrated => "unrated",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RatingBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "unrated" => Ok(Self::Unrated),
            _ => Err(format!("Invalid rating bucket: {s}")),
        }
    }
}

/// Every criterion left as `None` (or an empty query) matches all books.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookFilter {
    pub query: String,
    pub status: Option<BookStatus>,
    pub rating: Option<RatingBucket>,
    pub author: Option<String>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        self.matches_query(book)
            && self.status.is_none_or(|s| book.status == s)
            && self.rating.is_none_or(|r| RatingBucket::of(book.rating) == r)
            && self.author.as_deref().is_none_or(|a| book.author == a)
    }

    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        books.iter().filter(|b| self.matches(b)).collect()
    }

    fn matches_query(&self, book: &Book) -> bool {
        let needle = self.query.to_lowercase();
        needle.is_empty()
            || book.title.to_lowercase().contains(&needle)
            || book.author.to_lowercase().contains(&needle)
    }
}

/// The author with the most pages; the first one wins a tie.
pub fn top_author(authors: &[AuthorSummary]) -> Option<&AuthorSummary> {
    authors.iter().fold(None, |best, author| match best {
        Some(b) if b.pages_read >= author.pages_read => Some(b),
        _ => Some(author),
    })
}

pub fn filter_authors<'a>(authors: &'a [AuthorSummary], query: &str) -> Vec<&'a AuthorSummary> {
    let needle = query.to_lowercase();
    authors
        .iter()
        .filter(|a| needle.is_empty() || a.name.to_lowercase().contains(&needle))
        .collect()
}

/// Share of the library already read, in percent.
pub fn read_share_percent(overall: &OverallStats) -> f64 {
    let total = overall.total_read + overall.total_wishlist;
    if total == 0 {
        return 0.0;
    }
    overall.total_read as f64 / total as f64 * 100.0
}

/// Aggregates over the monthly buckets for the reading chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub max_books: u64,
    pub total_books: u64,
    pub total_pages: u64,
    pub avg_books_per_month: f64,
    pub avg_pages_per_month: u64,
}

impl MonthlyTrend {
    pub fn from_monthly(monthly: &[MonthlyStats]) -> Self {
        if monthly.is_empty() {
            return Self::default();
        }

        let months = monthly.len() as f64;
        let total_books: u64 = monthly.iter().map(|m| m.books_count).sum();
        let total_pages: u64 = monthly.iter().map(|m| m.pages_count).sum();

        Self {
            max_books: monthly.iter().map(|m| m.books_count).max().unwrap_or(0),
            total_books,
            total_pages,
            avg_books_per_month: total_books as f64 / months,
            avg_pages_per_month: (total_pages as f64 / months).round() as u64,
        }
    }

    /// Bar length for one month relative to the busiest month.
    pub fn bar_percent(&self, month: &MonthlyStats) -> f64 {
        if self.max_books == 0 {
            return 0.0;
        }
        month.books_count as f64 / self.max_books as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn book(title: &str, author: &str, status: BookStatus, pages: Option<u32>, rating: Option<f64>) -> Book {
        let now = Utc::now();
        Book {
            id: 0,
            title: title.to_string(),
            author: author.to_string(),
            status,
            cover_url: String::new(),
            year: None,
            rating,
            pages,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("The Master and Margarita", "Bulgakov", BookStatus::Read, Some(480), Some(5.0)),
            book("Heart of a Dog", "Bulgakov", BookStatus::Wishlist, Some(120), None),
            book("Dune", "Frank Herbert", BookStatus::Read, None, Some(3.0)),
            book("Solaris", "Lem", BookStatus::Read, Some(204), Some(2.0)),
            book("Fiasco", "Lem", BookStatus::Wishlist, None, Some(0.0)),
        ]
    }

    #[test]
    fn test_library_summary() {
        let summary = LibrarySummary::from_books(&shelf());
        assert_eq!(summary.total_read, 3);
        assert_eq!(summary.total_wishlist, 2);
        assert_eq!(summary.total_pages, 684);
        assert!((summary.avg_rating - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_library_summary_without_ratings() {
        let books = vec![book("A", "B", BookStatus::Wishlist, None, None)];
        assert_eq!(LibrarySummary::from_books(&books).avg_rating, 0.0);
        assert_eq!(LibrarySummary::from_books(&[]), LibrarySummary::default());
    }

    #[test]
    fn test_rating_buckets() {
        assert_eq!(RatingBucket::of(Some(5.0)), RatingBucket::High);
        assert_eq!(RatingBucket::of(Some(4.0)), RatingBucket::High);
        assert_eq!(RatingBucket::of(Some(3.99)), RatingBucket::Medium);
        assert_eq!(RatingBucket::of(Some(2.5)), RatingBucket::Medium);
        assert_eq!(RatingBucket::of(Some(2.49)), RatingBucket::Low);
        assert_eq!(RatingBucket::of(Some(0.5)), RatingBucket::Low);
        assert_eq!(RatingBucket::of(Some(0.0)), RatingBucket::Unrated);
        assert_eq!(RatingBucket::of(None), RatingBucket::Unrated);
        assert_eq!("medium".parse::<RatingBucket>().unwrap(), RatingBucket::Medium);
    }

    #[test]
    fn test_filter_query_is_case_insensitive() {
        let books = shelf();
        let filter = BookFilter {
            query: "BULGA".into(),
            ..BookFilter::default()
        };
        assert_eq!(filter.apply(&books).len(), 2);

        let filter = BookFilter {
            query: "dog".into(),
            ..BookFilter::default()
        };
        let hits = filter.apply(&books);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Heart of a Dog");

        let filter = BookFilter {
            query: "of a".into(),
            ..BookFilter::default()
        };
        assert_eq!(filter.apply(&books).len(), 1);
    }

    #[test]
    fn test_filter_combines_criteria() {
        let books = shelf();
        let filter = BookFilter {
            status: Some(BookStatus::Read),
            rating: Some(RatingBucket::Low),
            ..BookFilter::default()
        };
        let hits = filter.apply(&books);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Solaris");

        let filter = BookFilter {
            author: Some("Lem".into()),
            rating: Some(RatingBucket::Unrated),
            ..BookFilter::default()
        };
        let hits = filter.apply(&books);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Fiasco");
    }

    #[test]
    fn test_filter_author_is_exact() {
        let books = shelf();
        let filter = BookFilter {
            author: Some("lem".into()),
            ..BookFilter::default()
        };
        assert!(filter.apply(&books).is_empty());
        assert_eq!(BookFilter::default().apply(&books).len(), books.len());
    }

    fn author(name: &str, pages: u64) -> AuthorSummary {
        AuthorSummary {
            name: name.to_string(),
            books_count: 1,
            pages_read: pages,
            books: vec![],
        }
    }

    #[test]
    fn test_top_author() {
        let authors = vec![author("A", 100), author("B", 300), author("C", 300)];
        assert_eq!(top_author(&authors).unwrap().name, "B");
        assert!(top_author(&[]).is_none());
    }

    #[test]
    fn test_filter_authors() {
        let authors = vec![author("Leo Tolstoy", 1), author("Stanisław Lem", 2)];
        let hits = filter_authors(&authors, "lem");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Stanisław Lem");
        assert_eq!(filter_authors(&authors, "").len(), 2);
        assert_eq!(filter_authors(&authors, "leo ").len(), 1);
        assert!(filter_authors(&authors, "  ").is_empty());
    }

    #[test]
    fn test_read_share() {
        let overall = OverallStats {
            total_read: 3,
            total_wishlist: 1,
            ..OverallStats::default()
        };
        assert!((read_share_percent(&overall) - 75.0).abs() < 1e-9);
        assert_eq!(read_share_percent(&OverallStats::default()), 0.0);
    }

    #[test]
    fn test_monthly_trend() {
        let monthly = vec![
            MonthlyStats { year: 2024, month: 3, books_count: 4, pages_count: 1000 },
            MonthlyStats { year: 2024, month: 2, books_count: 2, pages_count: 501 },
            MonthlyStats { year: 2024, month: 1, books_count: 0, pages_count: 0 },
        ];
        let trend = MonthlyTrend::from_monthly(&monthly);
        assert_eq!(trend.max_books, 4);
        assert_eq!(trend.total_books, 6);
        assert_eq!(trend.total_pages, 1501);
        assert!((trend.avg_books_per_month - 2.0).abs() < 1e-9);
        assert_eq!(trend.avg_pages_per_month, 500);
        assert!((trend.bar_percent(&monthly[1]) - 50.0).abs() < 1e-9);
        assert_eq!(trend.bar_percent(&monthly[2]), 0.0);
    }

    #[test]
    fn test_monthly_trend_empty() {
        let trend = MonthlyTrend::from_monthly(&[]);
        assert_eq!(trend, MonthlyTrend::default());
        let month = MonthlyStats { year: 2024, month: 1, books_count: 3, pages_count: 0 };
        assert_eq!(trend.bar_percent(&month), 0.0);
    }
}
