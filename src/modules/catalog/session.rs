//! Interactive search state: query text, filters and the accumulated result list.
//!
//! Every fresh search bumps the session generation. Page tokens handed out by the
//! session carry that generation, so tokens from an earlier search are recognised as
//! stale, and responses that come back for an earlier generation are dropped.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::client::CatalogRequest;
use super::error::SearchError;
use super::models::{Book, BookType, OrderBy, PageToken, PrintType, SearchFilterOptions};
use super::search::Catalog;

/// Progress of one kind of request (refresh or append).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed { message: String, retryable: bool },
}

impl LoadState {
    fn failed(error: &SearchError) -> Self {
        LoadState::Failed {
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Page token as seen by session users: the catalog token tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPageToken {
    pub generation: u64,
    pub token: PageToken,
}

impl fmt::Display for SessionPageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.generation, self.token)
    }
}

impl FromStr for SessionPageToken {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SearchError::InvalidPageToken {
            token: s.to_string(),
        };
        let (generation, token) = s.split_once(':').ok_or_else(invalid)?;
        if token.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            generation: generation.parse().map_err(|_| invalid())?,
            token: PageToken::new(token),
        })
    }
}

/// Read-only view of a session, published on every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchSnapshot {
    pub query: String,
    pub filters: SearchFilterOptions,
    pub books: Vec<Book>,
    pub refresh: LoadState,
    pub append: LoadState,
    pub next_page_token: Option<String>,
    pub end_of_results: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Refresh,
    Append,
}

#[derive(Debug, Clone)]
struct FailedRequest {
    kind: RequestKind,
    request: CatalogRequest,
}

#[derive(Debug, Default)]
struct SessionState {
    query: String,
    filters: SearchFilterOptions,
    /// Query and filters of the search the current results belong to.
    active: Option<(String, SearchFilterOptions)>,
    books: Vec<Book>,
    refresh: LoadState,
    append: LoadState,
    next: Option<PageToken>,
    generation: u64,
    in_flight_append: Option<PageToken>,
    failed: Option<FailedRequest>,
}

impl SessionState {
    fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            filters: self.filters,
            books: self.books.clone(),
            refresh: self.refresh.clone(),
            append: self.append.clone(),
            next_page_token: self.next.as_ref().map(|token| {
                SessionPageToken {
                    generation: self.generation,
                    token: token.clone(),
                }
                .to_string()
            }),
            end_of_results: self.refresh == LoadState::Loaded && self.next.is_none(),
            generation: self.generation,
        }
    }

    /// Drop results and invalidate every token handed out so far.
    fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.active = None;
        self.books.clear();
        self.next = None;
        self.in_flight_append = None;
        self.failed = None;
        self.refresh = LoadState::Idle;
        self.append = LoadState::Idle;
        self.generation
    }
}

pub struct SearchSession {
    catalog: Catalog,
    state: Mutex<SessionState>,
    updates: watch::Sender<SearchSnapshot>,
}

impl SearchSession {
    pub fn new(catalog: Catalog) -> Self {
        let (updates, _) = watch::channel(SearchSnapshot::default());
        Self {
            catalog,
            state: Mutex::new(SessionState::default()),
            updates,
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.updates.subscribe()
    }

    /// Edit the query text without searching.
    pub fn set_query(&self, query: impl Into<String>) -> SearchSnapshot {
        let mut state = self.lock();
        state.query = query.into();
        self.publish(&state)
    }

    /// Empty the query and the result list.
    pub fn clear_query(&self) -> SearchSnapshot {
        let mut state = self.lock();
        state.query.clear();
        state.reset();
        self.publish(&state)
    }

    /// Replace the query text and run a fresh search.
    pub async fn search(&self, query: impl Into<String>) -> Result<SearchSnapshot, SearchError> {
        self.set_query(query);
        self.submit().await
    }

    /// Run a fresh search with the current query and filters.
    pub async fn submit(&self) -> Result<SearchSnapshot, SearchError> {
        let (generation, request) = {
            let mut state = self.lock();
            let request = self.catalog.request(&state.query, &state.filters, None)?;
            let generation = state.reset();
            state.active = Some((request.query.clone(), request.filters));
            state.refresh = LoadState::Loading;
            self.publish(&state);
            (generation, request)
        };

        tracing::debug!(
            target: "bookworm.catalog",
            generation,
            query = %request.query,
            "search session refresh"
        );
        self.run(generation, RequestKind::Refresh, request).await
    }

    /// Replace the filters without searching.
    pub fn update_filters(&self, filters: SearchFilterOptions) -> SearchSnapshot {
        let mut state = self.lock();
        state.filters = filters;
        self.publish(&state)
    }

    /// Change all filter axes at once; searches again when a query is present.
    pub async fn set_filters(
        &self,
        filters: SearchFilterOptions,
    ) -> Result<SearchSnapshot, SearchError> {
        let has_query = {
            let mut state = self.lock();
            if state.filters == filters {
                return Ok(state.snapshot());
            }
            state.filters = filters;
            self.publish(&state);
            !state.query.trim().is_empty()
        };

        if has_query {
            self.submit().await
        } else {
            Ok(self.snapshot())
        }
    }

    pub async fn set_order_by(&self, order_by: OrderBy) -> Result<SearchSnapshot, SearchError> {
        let filters = self.lock().filters.with_order_by(order_by);
        self.set_filters(filters).await
    }

    pub async fn set_print_type(
        &self,
        print_type: PrintType,
    ) -> Result<SearchSnapshot, SearchError> {
        let filters = self.lock().filters.with_print_type(print_type);
        self.set_filters(filters).await
    }

    pub async fn set_book_type(&self, book_type: BookType) -> Result<SearchSnapshot, SearchError> {
        let filters = self.lock().filters.with_book_type(book_type);
        self.set_filters(filters).await
    }

    /// Append the page named by `token`.
    ///
    /// Tokens from an earlier search, or already consumed, fail with
    /// [`SearchError::StalePageToken`]. A token whose page is still loading is ignored.
    pub async fn load_more(&self, token: &SessionPageToken) -> Result<SearchSnapshot, SearchError> {
        let (generation, request) = {
            let mut state = self.lock();
            if token.generation != state.generation {
                return Err(SearchError::StalePageToken);
            }
            if state.in_flight_append.as_ref() == Some(&token.token) {
                return Ok(state.snapshot());
            }
            if state.next.as_ref() != Some(&token.token) {
                return Err(SearchError::StalePageToken);
            }
            let (query, filters) = state.active.clone().ok_or(SearchError::StalePageToken)?;
            let request = self.catalog.request(&query, &filters, Some(&token.token))?;
            state.in_flight_append = Some(token.token.clone());
            state.failed = None;
            state.append = LoadState::Loading;
            self.publish(&state);
            (state.generation, request)
        };

        self.run(generation, RequestKind::Append, request).await
    }

    /// Replay the last failed request with its original page token.
    pub async fn retry(&self) -> Result<SearchSnapshot, SearchError> {
        let (generation, failed) = {
            let mut state = self.lock();
            let failed = match state.failed.take() {
                Some(failed) => failed,
                None => return Err(SearchError::NothingToRetry),
            };
            match failed.kind {
                RequestKind::Refresh => state.refresh = LoadState::Loading,
                RequestKind::Append => {
                    state.in_flight_append = failed.request.page_token.clone();
                    state.append = LoadState::Loading;
                }
            }
            self.publish(&state);
            (state.generation, failed)
        };

        tracing::debug!(
            target: "bookworm.catalog",
            generation,
            kind = ?failed.kind,
            "retrying catalog request"
        );
        self.run(generation, failed.kind, failed.request).await
    }

    async fn run(
        &self,
        generation: u64,
        kind: RequestKind,
        request: CatalogRequest,
    ) -> Result<SearchSnapshot, SearchError> {
        let result = self.catalog.fetch(&request).await;

        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                target: "bookworm.catalog",
                generation,
                current = state.generation,
                "discarding superseded catalog response"
            );
            return Err(SearchError::Superseded);
        }

        match result {
            Ok(page) => {
                match kind {
                    RequestKind::Refresh => {
                        state.books = page.items;
                        state.refresh = LoadState::Loaded;
                    }
                    RequestKind::Append => {
                        state.books.extend(page.items);
                        state.in_flight_append = None;
                        state.append = LoadState::Loaded;
                    }
                }
                state.next = page.next_page_token;
                state.failed = None;
                Ok(self.publish(&state))
            }
            Err(err) => {
                match kind {
                    RequestKind::Refresh => state.refresh = LoadState::failed(&err),
                    RequestKind::Append => {
                        state.in_flight_append = None;
                        state.append = LoadState::failed(&err);
                    }
                }
                if err.is_retryable() {
                    state.failed = Some(FailedRequest { kind, request });
                }
                self.publish(&state);
                Err(err)
            }
        }
    }

    fn publish(&self, state: &SessionState) -> SearchSnapshot {
        let snapshot = state.snapshot();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
