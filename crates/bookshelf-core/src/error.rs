use thiserror::Error;

/// All errors that can occur in bookshelf-core.
#[derive(Debug, Error)]
pub enum BookshelfError {
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid timestamp in database: {0}")]
    InvalidTimestamp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Exit codes used by the `bookshelf` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    NetworkError = 6,
    Conflict = 7,
    ConfirmRequired = 8,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl BookshelfError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::BookNotFound(_) => ExitCode::NotFound,
            Self::ValidationError(_) | Self::InvalidStatus(_) => ExitCode::InvalidArgs,
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookshelfError>;
