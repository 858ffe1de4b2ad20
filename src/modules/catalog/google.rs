//! Google Books volumes API client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use bookworm_kernel::settings::CatalogSettings;

use super::client::{CatalogClient, CatalogRequest};
use super::error::SearchError;
use super::models::{Book, PageToken, SearchPage};

const USER_AGENT: &str = concat!("bookworm/", env!("CARGO_PKG_VERSION"));
const UNTITLED: &str = "Untitled";

/// Talks to `GET {base_url}/volumes`.
///
/// Page tokens are the decimal `startIndex` of the page they name.
pub struct GoogleBooksClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(settings: &CatalogSettings) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn query_params(&self, request: &CatalogRequest, start_index: u32) -> Vec<(&'static str, String)> {
        let filters = &request.filters;
        let mut params = vec![
            ("q", request.query.clone()),
            ("orderBy", filters.order_by.as_query_value().to_string()),
            ("printType", filters.print_type.as_query_value().to_string()),
        ];
        if let Some(filter) = filters.book_type.as_filter_value() {
            params.push(("filter", filter.to_string()));
        }
        params.push(("startIndex", start_index.to_string()));
        params.push(("maxResults", request.page_size.to_string()));
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }
}

#[async_trait]
impl CatalogClient for GoogleBooksClient {
    async fn fetch_page(&self, request: &CatalogRequest) -> Result<SearchPage, SearchError> {
        let start_index = start_index(request.page_token.as_ref())?;
        let url = format!("{}/volumes", self.base_url);

        tracing::debug!(
            target: "bookworm.catalog",
            query = %request.query,
            start_index,
            page_size = request.page_size,
            "requesting volumes"
        );

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(request, start_index))
            .send()
            .await
            .map_err(|e| SearchError::transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::from_status(
                status.as_u16(),
                format!("catalog answered {}: {}", status, truncate(&body, 200)),
            ));
        }

        let volumes: VolumesResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                SearchError::malformed(format!("unreadable volumes response: {}", e))
            } else {
                SearchError::transport(&e)
            }
        })?;

        Ok(volumes.into_page(start_index, request.page_size))
    }
}

/// Decode a page token into a `startIndex`; no token means the first page.
fn start_index(token: Option<&PageToken>) -> Result<u32, SearchError> {
    match token {
        None => Ok(0),
        Some(token) => token
            .as_str()
            .parse::<u32>()
            .map_err(|_| SearchError::InvalidPageToken {
                token: token.to_string(),
            }),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    #[serde(default)]
    small_thumbnail: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

impl VolumesResponse {
    fn into_page(self, start_index: u32, page_size: u32) -> SearchPage {
        let count = self.items.len() as u32;
        let next_start = start_index.saturating_add(count);
        let next_page_token = (count > 0 && count >= page_size && next_start < self.total_items)
            .then(|| PageToken::new(next_start.to_string()));

        SearchPage {
            items: self.items.into_iter().map(Volume::into_book).collect(),
            next_page_token,
        }
    }
}

impl Volume {
    fn into_book(self) -> Book {
        let info = self.volume_info;
        let authors = (!info.authors.is_empty()).then(|| info.authors.join(", "));
        let thumbnail = info
            .image_links
            .and_then(|links| links.thumbnail.or(links.small_thumbnail))
            .map(|url| upgrade_to_https(&url));

        Book {
            id: self.id,
            title: info
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            authors,
            thumbnail,
        }
    }
}

/// The catalog hands out `http://` image links; clients load them over TLS.
fn upgrade_to_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}
