use async_trait::async_trait;

use super::error::SearchError;
use super::models::{PageToken, SearchFilterOptions, SearchPage};

/// Everything the catalog needs to serve one page.
///
/// Two equal requests ask for the same page, which is what makes retries safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub query: String,
    pub filters: SearchFilterOptions,
    pub page_token: Option<PageToken>,
    pub page_size: u32,
}

/// A remote book catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of results.
    async fn fetch_page(&self, request: &CatalogRequest) -> Result<SearchPage, SearchError>;
}
