use serde::{Deserialize, Serialize};

/// One row of the author index served by `GET /authors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub name: String,
    pub books_count: u64,
    pub pages_read: u64,
    #[serde(default)]
    pub books: Vec<String>,
}
