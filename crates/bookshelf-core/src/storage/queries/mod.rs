mod authors;
mod stats;

pub use authors::AuthorIndexQuery;
pub use stats::{ReadingStatsQuery, MONTHLY_WINDOW};
