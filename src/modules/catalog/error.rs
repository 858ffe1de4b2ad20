use thiserror::Error;

/// Failures of catalog searches and search sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search query must not be blank")]
    InvalidQuery,

    #[error("page token '{token}' is not valid for this catalog")]
    InvalidPageToken { token: String },

    #[error("page token does not belong to the current search")]
    StalePageToken,

    #[error("search was superseded by a newer request")]
    Superseded,

    #[error("there is no failed request to retry")]
    NothingToRetry,

    #[error("catalog request failed: {message}")]
    Catalog {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },
}

impl SearchError {
    /// Whether re-issuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Catalog { retryable: true, .. })
    }

    /// Classify a non-success HTTP status from the catalog.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let retryable = matches!(status, 408 | 429) || (500..=599).contains(&status);
        SearchError::Catalog {
            message: message.into(),
            status: Some(status),
            retryable,
        }
    }

    /// Classify a transport-level failure.
    pub fn transport(error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::from_status(status.as_u16(), error.to_string());
        }
        let retryable = (error.is_timeout() || error.is_connect() || error.is_request())
            && !error.is_builder()
            && !error.is_decode();
        SearchError::Catalog {
            message: error.to_string(),
            status: None,
            retryable,
        }
    }

    /// A response that arrived but could not be understood.
    pub fn malformed(message: impl Into<String>) -> Self {
        SearchError::Catalog {
            message: message.into(),
            status: None,
            retryable: false,
        }
    }
}
