use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use bookworm_http::error::AppError;

use super::controller::BookStatsController;
use super::error::LibraryError;
use super::models::{LibraryEntry, ReadingStatus};
use super::session::{BookStatsEvent, BookStatsState};
use super::store::LibraryStore;
use crate::modules::catalog::models::Book;

pub fn router(store: Arc<LibraryStore>) -> Router {
    Router::new()
        .route("/", get(list_entries).post(add_book))
        .route("/health", get(health_check))
        .route(
            "/{book_id}",
            get(get_entry)
                .put(put_entry)
                .patch(patch_entry)
                .delete(delete_entry),
        )
        .route("/{book_id}/status", put(set_status))
        .with_state(store)
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        let message = err.to_string();
        match err {
            LibraryError::Validation { field, message: reason } => {
                AppError::validation(vec![json!({ "field": field, "error": reason })], message)
            }
            LibraryError::InvalidStatus { value } => AppError::validation(
                vec![json!({ "field": "status", "error": "unknown status", "value": value })],
                message,
            )
            .with_code("invalid_status"),
            LibraryError::NotFound { .. } => AppError::not_found(message),
            LibraryError::SaveInProgress { .. } => {
                AppError::conflict(vec![], message).with_code("save_in_progress")
            }
            LibraryError::NothingLoaded => {
                AppError::conflict(vec![], message).with_code("nothing_loaded")
            }
            LibraryError::Storage(source) => {
                AppError::Internal(anyhow::Error::new(source).context("library storage failed"))
            }
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PutEntryRequest {
    book: Book,
    status: String,
    #[serde(default)]
    rating: i32,
    #[serde(default)]
    thoughts: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchEntryRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    rating: Option<i32>,
    #[serde(default)]
    thoughts: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    status: String,
}

async fn list_entries(
    State(store): State<Arc<LibraryStore>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<LibraryEntry>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ReadingStatus>)
        .transpose()?;
    Ok(Json(store.list_entries(status).await?))
}

/// Add a catalog book; answers 201 when created, 200 when it was already there
async fn add_book(
    State(store): State<Arc<LibraryStore>>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<(StatusCode, Json<LibraryEntry>), AppError> {
    let book = body(payload)?;
    let (entry, created) = store.add_book(book).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(entry)))
}

async fn get_entry(
    State(store): State<Arc<LibraryStore>>,
    Path(book_id): Path<String>,
) -> Result<Json<LibraryEntry>, AppError> {
    store
        .get_entry(&book_id)
        .await?
        .map(Json)
        .ok_or_else(|| LibraryError::not_found(book_id.as_str()).into())
}

async fn put_entry(
    State(store): State<Arc<LibraryStore>>,
    Path(book_id): Path<String>,
    payload: Result<Json<PutEntryRequest>, JsonRejection>,
) -> Result<Json<LibraryEntry>, AppError> {
    let request = body(payload)?;
    if request.book.id != book_id {
        return Err(LibraryError::validation(
            "book_id",
            format!("body book id '{}' does not match path '{}'", request.book.id, book_id),
        )
        .into());
    }

    let entry = LibraryEntry {
        book: request.book,
        status: request.status.parse()?,
        rating: request.rating,
        thoughts: request.thoughts,
    };
    Ok(Json(store.upsert_entry(entry).await?))
}

/// Apply edits through the book-stats state holder and save them as one batch
async fn patch_entry(
    State(store): State<Arc<LibraryStore>>,
    Path(book_id): Path<String>,
    payload: Result<Json<PatchEntryRequest>, JsonRejection>,
) -> Result<Json<BookStatsState>, AppError> {
    let request = body(payload)?;
    let status = request
        .status
        .as_deref()
        .map(str::parse::<ReadingStatus>)
        .transpose()?;

    let controller = BookStatsController::new(store);
    controller
        .dispatch(BookStatsEvent::LoadStats(Some(book_id)))
        .await?;

    if let Some(status) = status {
        controller
            .dispatch(BookStatsEvent::StatusChange(status))
            .await?;
    }
    if let Some(rating) = request.rating {
        controller.dispatch(BookStatsEvent::SetRating(rating)).await?;
    }
    if let Some(thoughts) = request.thoughts {
        controller
            .dispatch(BookStatsEvent::ThoughtsChange(thoughts))
            .await?;
    }

    Ok(Json(
        controller
            .dispatch(BookStatsEvent::SaveChangesClick)
            .await?,
    ))
}

async fn delete_entry(
    State(store): State<Arc<LibraryStore>>,
    Path(book_id): Path<String>,
) -> Result<StatusCode, AppError> {
    store.delete_entry(&book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    State(store): State<Arc<LibraryStore>>,
    Path(book_id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<LibraryEntry>, AppError> {
    let request = body(payload)?;
    let status: ReadingStatus = request.status.parse()?;
    Ok(Json(store.set_status(&book_id, status).await?))
}

async fn health_check() -> &'static str {
    "library module is healthy"
}
