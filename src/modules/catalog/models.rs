use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils;

/// A catalog entry. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Catalog-assigned identifier
    pub id: String,
    /// Title of the book
    pub title: String,
    /// Comma-separated author names, when the catalog knows them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// Cover thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: None,
            thumbnail: None,
        }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Authors for display; `"Unknown"` when absent.
    pub fn authors_display(&self) -> &str {
        utils::or_unknown(self.authors.as_deref())
    }
}

/// Result ordering requested from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Relevance,
    Newest,
}

impl OrderBy {
    pub const ALL: [OrderBy; 2] = [OrderBy::Relevance, OrderBy::Newest];

    pub fn as_query_value(self) -> &'static str {
        match self {
            OrderBy::Relevance => "relevance",
            OrderBy::Newest => "newest",
        }
    }
}

/// Kind of printed material to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    #[default]
    All,
    Books,
    Magazines,
}

impl PrintType {
    pub const ALL: [PrintType; 3] = [PrintType::All, PrintType::Books, PrintType::Magazines];

    pub fn as_query_value(self) -> &'static str {
        match self {
            PrintType::All => "all",
            PrintType::Books => "books",
            PrintType::Magazines => "magazines",
        }
    }
}

/// Availability of the edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookType {
    #[default]
    All,
    Free,
    Paid,
}

impl BookType {
    pub const ALL: [BookType; 3] = [BookType::All, BookType::Free, BookType::Paid];

    /// Value of the catalog `filter` parameter; `None` means no filtering.
    pub fn as_filter_value(self) -> Option<&'static str> {
        match self {
            BookType::All => None,
            BookType::Free => Some("free-ebooks"),
            BookType::Paid => Some("paid-ebooks"),
        }
    }
}

/// One selected value per filter axis. Axes change independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchFilterOptions {
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub print_type: PrintType,
    #[serde(default)]
    pub book_type: BookType,
}

impl SearchFilterOptions {
    pub fn with_order_by(self, order_by: OrderBy) -> Self {
        Self { order_by, ..self }
    }

    pub fn with_print_type(self, print_type: PrintType) -> Self {
        Self { print_type, ..self }
    }

    pub fn with_book_type(self, book_type: BookType) -> Self {
        Self { book_type, ..self }
    }
}

/// Opaque cursor naming the next page of a catalog result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<Book>,
    /// `None` once the catalog has no more results.
    pub next_page_token: Option<PageToken>,
}

impl SearchPage {
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}
