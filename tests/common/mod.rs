#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use bookworm_app::modules::catalog::models::{Book, PageToken, SearchPage};
use bookworm_app::modules::catalog::{
    Catalog, CatalogClient, CatalogRequest, SearchError, SessionLimits,
};
use bookworm_app::modules::library::LibraryStore;
use bookworm_app::modules::{self, Services};
use bookworm_db::MemoryRepository;
use bookworm_events::EventBus;
use bookworm_kernel::settings::{Settings, StorageBackend};
use bookworm_kernel::{InitCtx, ModuleRegistry};

/// Catalog stand-in answering from a queue and recording every request.
#[derive(Default)]
pub struct FakeCatalog {
    responses: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
    requests: Mutex<Vec<CatalogRequest>>,
}

impl FakeCatalog {
    pub fn push(&self, response: Result<SearchPage, SearchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_page(&self, request: &CatalogRequest) -> Result<SearchPage, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(SearchPage {
            items: Vec::new(),
            next_page_token: None,
        }))
    }
}

/// A page of books `prefix0..prefixN` with an optional next token.
pub fn page(prefix: &str, range: std::ops::Range<usize>, next: Option<&str>) -> SearchPage {
    SearchPage {
        items: range
            .map(|i| Book::new(format!("{prefix}{i}"), format!("{prefix} volume {i}")))
            .collect(),
        next_page_token: next.map(PageToken::new),
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.storage.backend = StorageBackend::Memory;
    settings.catalog.page_size = 20;
    settings
}

/// Build the full application router over in-memory storage and `catalog`.
pub async fn build_test_app(catalog: Arc<FakeCatalog>) -> Router {
    build_test_app_with(catalog, test_settings()).await
}

pub async fn build_test_app_with(catalog: Arc<FakeCatalog>, settings: Settings) -> Router {
    let events = Arc::new(EventBus::default());
    let services = Services {
        library: Arc::new(LibraryStore::new(
            Arc::new(MemoryRepository::new()),
            events.clone(),
        )),
        catalog: Catalog::new(catalog, settings.catalog.page_size),
        session_limits: SessionLimits::from(&settings.catalog),
    };

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &services).unwrap();
    let ctx = InitCtx {
        settings: &settings,
        events: &events,
    };
    registry.init_modules(&ctx).await.unwrap();

    bookworm_http::build_router(&registry, &settings)
}

/// Send one request; the body is parsed as JSON when possible, else returned as a string.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::DELETE, uri, None).await
}
