use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use bookworm_http::error::AppError;

use super::error::SearchError;
use super::models::{BookType, OrderBy, PageToken, PrintType, SearchFilterOptions, SearchPage};
use super::search::Catalog;
use super::session::{SearchSession, SearchSnapshot, SessionPageToken};
use super::session_store::SessionStore;

pub type Sessions = Arc<SessionStore>;

#[derive(Clone)]
pub struct CatalogState {
    pub catalog: Catalog,
    pub sessions: Sessions,
}

pub fn router(state: CatalogState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/search", post(session_search))
        .route("/sessions/{id}/more", post(session_more))
        .route("/sessions/{id}/retry", post(session_retry))
        .route("/health", get(health_check))
        .with_state(state)
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        let message = err.to_string();
        match err {
            SearchError::InvalidQuery => AppError::bad_request(message).with_code("invalid_query"),
            SearchError::InvalidPageToken { .. } => {
                AppError::bad_request(message).with_code("invalid_page_token")
            }
            SearchError::StalePageToken => {
                AppError::conflict(vec![], message).with_code("stale_page_token")
            }
            SearchError::Superseded => AppError::conflict(vec![], message).with_code("superseded"),
            SearchError::NothingToRetry => {
                AppError::conflict(vec![], message).with_code("nothing_to_retry")
            }
            SearchError::Catalog { retryable, .. } => AppError::upstream(message, retryable),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    order_by: Option<OrderBy>,
    print_type: Option<PrintType>,
    book_type: Option<BookType>,
    page_token: Option<String>,
}

impl SearchParams {
    fn filters(&self) -> SearchFilterOptions {
        SearchFilterOptions {
            order_by: self.order_by.unwrap_or_default(),
            print_type: self.print_type.unwrap_or_default(),
            book_type: self.book_type.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    filters: Option<SearchFilterOptions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionSearchRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    filters: Option<SearchFilterOptions>,
}

#[derive(Debug, Deserialize)]
pub struct LoadMoreRequest {
    page_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    id: Uuid,
    #[serde(flatten)]
    snapshot: SearchSnapshot,
}

/// Stateless single-page search
async fn search(
    State(state): State<CatalogState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchPage>, AppError> {
    let Query(params) = params.map_err(|e| AppError::bad_request(e.body_text()))?;
    let filters = params.filters();
    let token = params
        .page_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(PageToken::new);

    let page = state
        .catalog
        .search(params.q.as_deref().unwrap_or_default(), &filters, token.as_ref())
        .await?;
    Ok(Json(page))
}

async fn create_session(
    State(state): State<CatalogState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;

    let session = SearchSession::new(state.catalog.clone());
    if let Some(filters) = body.filters {
        session.update_filters(filters);
    }
    let snapshot = session.snapshot();
    let (id, _) = state.sessions.open(session);

    tracing::info!(session_id = %id, open_sessions = state.sessions.len(), "search session created");
    Ok((StatusCode::CREATED, Json(SessionView { id, snapshot })))
}

async fn get_session(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id)?;
    Ok(Json(SessionView {
        id,
        snapshot: session.snapshot(),
    }))
}

async fn delete_session(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.close(&id) {
        tracing::info!(session_id = %id, "search session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// Fresh search: optionally replace query and filters, then search from the first page
async fn session_search(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
    body: Result<Json<SessionSearchRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let session = find_session(&state, id)?;

    if let Some(query) = body.query {
        session.set_query(query);
    }
    if let Some(filters) = body.filters {
        session.update_filters(filters);
    }
    let snapshot = session.submit().await?;
    Ok(Json(SessionView { id, snapshot }))
}

async fn session_more(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
    body: Result<Json<LoadMoreRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let session = find_session(&state, id)?;

    let token: SessionPageToken = body.page_token.parse()?;
    let snapshot = session.load_more(&token).await?;
    Ok(Json(SessionView { id, snapshot }))
}

async fn session_retry(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id)?;
    let snapshot = session.retry().await?;
    Ok(Json(SessionView { id, snapshot }))
}

async fn health_check() -> &'static str {
    "catalog module is healthy"
}

fn find_session(state: &CatalogState, id: Uuid) -> Result<Arc<SearchSession>, AppError> {
    state
        .sessions
        .get(&id)
        .ok_or_else(|| session_not_found(id))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("search session '{}' does not exist", id))
        .with_code("session_not_found")
}
