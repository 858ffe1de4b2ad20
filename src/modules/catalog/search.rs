use std::sync::Arc;

use super::client::{CatalogClient, CatalogRequest};
use super::error::SearchError;
use super::models::{PageToken, SearchFilterOptions, SearchPage};

/// Stateless search front door over a [`CatalogClient`].
#[derive(Clone)]
pub struct Catalog {
    client: Arc<dyn CatalogClient>,
    page_size: u32,
}

impl Catalog {
    pub fn new(client: Arc<dyn CatalogClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch one page of results for `query`.
    ///
    /// A blank query fails with [`SearchError::InvalidQuery`] before the client is consulted.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilterOptions,
        page_token: Option<&PageToken>,
    ) -> Result<SearchPage, SearchError> {
        let request = self.request(query, filters, page_token)?;
        self.fetch(&request).await
    }

    /// Build a validated request without sending it.
    pub fn request(
        &self,
        query: &str,
        filters: &SearchFilterOptions,
        page_token: Option<&PageToken>,
    ) -> Result<CatalogRequest, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        Ok(CatalogRequest {
            query: query.to_string(),
            filters: *filters,
            page_token: page_token.cloned(),
            page_size: self.page_size,
        })
    }

    pub async fn fetch(&self, request: &CatalogRequest) -> Result<SearchPage, SearchError> {
        let result = self.client.fetch_page(request).await;
        match &result {
            Ok(page) => tracing::debug!(
                target: "bookworm.catalog",
                query = %request.query,
                items = page.items.len(),
                last = page.is_last(),
                "catalog page fetched"
            ),
            Err(err) => tracing::warn!(
                target: "bookworm.catalog",
                query = %request.query,
                retryable = err.is_retryable(),
                error = %err,
                "catalog page failed"
            ),
        }
        result
    }
}
