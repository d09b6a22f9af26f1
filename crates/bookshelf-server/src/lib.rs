//! Bookshelf Server: axum HTTP backend for the books, stats and authors endpoints.

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{router, BookshelfServer, ServerHandle};
pub use state::{AppState, SharedState};
