use thiserror::Error;

use bookworm_db::StorageError;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("'{value}' is not a reading status (expected ON_QUEUE, READING or READ)")]
    InvalidStatus { value: String },

    #[error("book '{book_id}' is not in the library")]
    NotFound { book_id: String },

    #[error("a save for book '{book_id}' is already in progress")]
    SaveInProgress { book_id: String },

    #[error("no book is loaded")]
    NothingLoaded,

    #[error(transparent)]
    Storage(StorageError),
}

impl LibraryError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(book_id: impl Into<String>) -> Self {
        Self::NotFound {
            book_id: book_id.into(),
        }
    }
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey { reason, .. } => Self::validation("book_id", reason),
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
