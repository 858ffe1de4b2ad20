use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LibraryError;
use crate::modules::catalog::models::Book;
use crate::utils;

pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

/// Where a book sits on the reader's shelves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    #[default]
    OnQueue,
    Reading,
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::OnQueue,
        ReadingStatus::Reading,
        ReadingStatus::Read,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::OnQueue => "ON_QUEUE",
            ReadingStatus::Reading => "READING",
            ReadingStatus::Read => "READ",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LibraryError::InvalidStatus {
                value: s.to_string(),
            })
    }
}

/// A book the reader keeps, with their status, rating and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub book: Book,
    pub status: ReadingStatus,
    /// 0 means unrated
    #[serde(default)]
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
}

impl LibraryEntry {
    /// Entry for a freshly added book: queued, unrated, no thoughts.
    pub fn new(book: Book) -> Self {
        Self {
            book,
            status: ReadingStatus::OnQueue,
            rating: MIN_RATING,
            thoughts: None,
        }
    }

    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_thoughts(mut self, thoughts: impl Into<String>) -> Self {
        self.thoughts = Some(thoughts.into());
        self
    }

    pub fn book_id(&self) -> &str {
        &self.book.id
    }

    /// Check the invariants a stored entry must hold.
    pub fn validate(&self) -> Result<(), LibraryError> {
        if self.book.id.trim().is_empty() {
            return Err(LibraryError::validation("book_id", "book id must not be blank"));
        }
        if self.book.title.trim().is_empty() {
            return Err(LibraryError::validation("title", "title must not be blank"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(LibraryError::validation(
                "rating",
                format!(
                    "rating must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, self.rating
                ),
            ));
        }
        Ok(())
    }

    /// Blank thoughts are stored as absent.
    pub(crate) fn normalized(mut self) -> Self {
        self.thoughts = utils::non_blank(self.thoughts.take());
        self
    }
}
