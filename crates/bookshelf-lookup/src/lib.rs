//! Bookshelf Lookup: catalog search against Open Library.

pub mod error;
pub mod http;
pub mod sources;

pub use error::{LookupError, Result};
pub use sources::openlibrary::OpenLibrarySource;
pub use sources::CatalogSource;
