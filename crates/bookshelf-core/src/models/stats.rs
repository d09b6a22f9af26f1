use serde::{Deserialize, Serialize};

/// Payload of `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub overall: OverallStats,
    #[serde(default)]
    pub monthly: Vec<MonthlyStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_read: u64,
    pub total_wishlist: u64,
    pub total_pages: u64,
    pub avg_rating: f64,
}

/// Read books added during one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub books_count: u64,
    pub pages_count: u64,
}

impl MonthlyStats {
    /// `YYYY-MM` label used in listings.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
