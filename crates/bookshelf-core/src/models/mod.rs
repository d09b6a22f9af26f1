pub mod author;
pub mod book;
pub mod catalog;
pub mod stats;

pub use author::*;
pub use book::*;
pub use catalog::*;
pub use stats::*;
