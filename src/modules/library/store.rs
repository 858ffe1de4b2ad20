//! The single owner of persisted library entries.

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bookworm_db::Repository;
use bookworm_events::{DomainEvent, EventBus};

use super::error::{LibraryError, Result};
use super::models::{LibraryEntry, ReadingStatus};
use crate::modules::catalog::models::Book;

pub const ENTRY_SAVED: &str = "library.entry.saved";
pub const ENTRY_STATUS_CHANGED: &str = "library.entry.status_changed";
pub const ENTRY_DELETED: &str = "library.entry.deleted";

/// Library entries keyed by book id.
///
/// Mutations of one book id run one at a time; different ids do not wait on each
/// other. Every mutation has been persisted by the time it returns.
pub struct LibraryStore {
    repository: Arc<dyn Repository<LibraryEntry>>,
    events: Arc<EventBus>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LibraryStore {
    pub fn new(repository: Arc<dyn Repository<LibraryEntry>>, events: Arc<EventBus>) -> Self {
        Self {
            repository,
            events,
            locks: DashMap::new(),
        }
    }

    pub async fn get_entry(&self, book_id: &str) -> Result<Option<LibraryEntry>> {
        Ok(self.repository.get(book_id).await?)
    }

    /// Insert or replace the entry for its book id.
    pub async fn upsert_entry(&self, entry: LibraryEntry) -> Result<LibraryEntry> {
        let entry = entry.normalized();
        entry.validate()?;

        let _guard = self.lock(entry.book_id()).await;
        self.persist(entry).await
    }

    /// Write the fields `edited` changed relative to `baseline` onto the stored entry.
    ///
    /// Read, merge and write happen under the book's lock, so concurrent edits to
    /// different fields of one book all land.
    pub async fn save_edits(
        &self,
        baseline: &LibraryEntry,
        edited: LibraryEntry,
    ) -> Result<LibraryEntry> {
        let edited = edited.normalized();
        edited.validate()?;

        let _guard = self.lock(edited.book_id()).await;
        let mut entry = self
            .repository
            .get(edited.book_id())
            .await?
            .ok_or_else(|| LibraryError::not_found(edited.book_id()))?;

        if edited.status != baseline.status {
            entry.status = edited.status;
        }
        if edited.rating != baseline.rating {
            entry.rating = edited.rating;
        }
        if edited.thoughts != baseline.thoughts {
            entry.thoughts = edited.thoughts;
        }
        self.persist(entry).await
    }

    /// Caller holds the book's lock.
    async fn persist(&self, entry: LibraryEntry) -> Result<LibraryEntry> {
        self.repository.put(entry.book_id(), &entry).await?;

        tracing::debug!(
            book_id = %entry.book_id(),
            status = %entry.status,
            rating = entry.rating,
            "library entry saved"
        );
        self.events.publish(
            DomainEvent::new(ENTRY_SAVED)
                .with_subject(entry.book_id())
                .with_payload(json!({
                    "status": entry.status,
                    "rating": entry.rating,
                    "has_thoughts": entry.thoughts.is_some(),
                })),
        );
        Ok(entry)
    }

    /// Remove the entry; removing an absent entry is a no-op.
    ///
    /// # Returns
    /// `true` if an entry was removed
    pub async fn delete_entry(&self, book_id: &str) -> Result<bool> {
        let _guard = self.lock(book_id).await;
        let removed = self.repository.delete(book_id).await?;

        if removed {
            tracing::debug!(book_id = %book_id, "library entry deleted");
            self.events
                .publish(DomainEvent::new(ENTRY_DELETED).with_subject(book_id));
        }
        Ok(removed)
    }

    /// Move an existing entry to `status`, keeping rating and thoughts.
    pub async fn set_status(&self, book_id: &str, status: ReadingStatus) -> Result<LibraryEntry> {
        let _guard = self.lock(book_id).await;
        let mut entry = self
            .repository
            .get(book_id)
            .await?
            .ok_or_else(|| LibraryError::not_found(book_id))?;

        let previous = entry.status;
        entry.status = status;
        self.repository.put(book_id, &entry).await?;

        tracing::debug!(book_id = %book_id, from = %previous, to = %status, "reading status changed");
        self.events.publish(
            DomainEvent::new(ENTRY_STATUS_CHANGED)
                .with_subject(book_id)
                .with_payload(json!({ "from": previous, "to": status })),
        );
        Ok(entry)
    }

    /// Add a catalog book with a default entry.
    ///
    /// An existing entry is returned untouched; the flag tells whether one was created.
    pub async fn add_book(&self, book: Book) -> Result<(LibraryEntry, bool)> {
        let entry = LibraryEntry::new(book);
        entry.validate()?;

        let _guard = self.lock(entry.book_id()).await;
        if let Some(existing) = self.repository.get(entry.book_id()).await? {
            return Ok((existing, false));
        }
        self.repository.put(entry.book_id(), &entry).await?;

        tracing::info!(book_id = %entry.book_id(), title = %entry.book.title, "book added to library");
        self.events.publish(
            DomainEvent::new(ENTRY_SAVED)
                .with_subject(entry.book_id())
                .with_payload(json!({
                    "status": entry.status,
                    "rating": entry.rating,
                    "has_thoughts": false,
                })),
        );
        Ok((entry, true))
    }

    /// Every entry, optionally one shelf only, ordered by title then id.
    pub async fn list_entries(&self, status: Option<ReadingStatus>) -> Result<Vec<LibraryEntry>> {
        let mut entries: Vec<LibraryEntry> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter(|entry| status.map_or(true, |s| entry.status == s))
            .collect();

        entries.sort_by_cached_key(|entry| (entry.book.title.to_lowercase(), entry.book.id.clone()));
        Ok(entries)
    }

    async fn lock(&self, book_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(book_id.to_string()).or_default().clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookworm_db::{JsonFileRepository, MemoryRepository};

    fn store() -> LibraryStore {
        LibraryStore::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(EventBus::default()),
        )
    }

    fn entry(id: &str, title: &str) -> LibraryEntry {
        LibraryEntry::new(Book::new(id, title))
    }

    #[tokio::test]
    async fn upsert_accepts_only_ratings_zero_to_five() {
        let store = store();
        for rating in -2..=7 {
            let result = store.upsert_entry(entry("b1", "Dune").with_rating(rating)).await;
            if (0..=5).contains(&rating) {
                assert_eq!(result.unwrap().rating, rating);
            } else {
                assert!(
                    matches!(result, Err(LibraryError::Validation { field: "rating", .. })),
                    "rating {rating}"
                );
            }
        }
        assert_eq!(store.get_entry("b1").await.unwrap().unwrap().rating, 5);
    }

    #[tokio::test]
    async fn delete_twice_is_idempotent() {
        let store = store();
        store.upsert_entry(entry("b1", "Dune")).await.unwrap();

        assert!(store.delete_entry("b1").await.unwrap());
        assert!(store.get_entry("b1").await.unwrap().is_none());

        assert!(!store.delete_entry("b1").await.unwrap());
        assert!(store.get_entry("b1").await.unwrap().is_none());
        assert!(!store.delete_entry("never-added").await.unwrap());
    }

    #[tokio::test]
    async fn status_round_trips_from_any_prior_status() {
        let store = store();
        store.upsert_entry(entry("b1", "Dune")).await.unwrap();

        for from in ReadingStatus::ALL {
            for to in ReadingStatus::ALL {
                store.set_status("b1", from).await.unwrap();
                store.set_status("b1", to).await.unwrap();
                assert_eq!(store.get_entry("b1").await.unwrap().unwrap().status, to);
            }
        }
    }

    #[tokio::test]
    async fn b1_scenario() {
        let store = store();
        let saved = store.upsert_entry(entry("b1", "Dune")).await.unwrap();
        assert_eq!(store.get_entry("b1").await.unwrap(), Some(saved));

        store.set_status("b1", ReadingStatus::Read).await.unwrap();
        let read = store.get_entry("b1").await.unwrap().unwrap();
        assert_eq!(read.status, ReadingStatus::Read);
        assert_eq!(read.rating, 0);
    }

    #[tokio::test]
    async fn set_status_on_missing_book_is_not_found() {
        let store = store();
        assert!(matches!(
            store.set_status("ghost", ReadingStatus::Read).await,
            Err(LibraryError::NotFound { ref book_id }) if book_id == "ghost"
        ));
    }

    #[tokio::test]
    async fn set_status_keeps_rating_and_thoughts() {
        let store = store();
        store
            .upsert_entry(entry("b1", "Dune").with_rating(4).with_thoughts("spice"))
            .await
            .unwrap();

        let updated = store.set_status("b1", ReadingStatus::Reading).await.unwrap();
        assert_eq!(updated.rating, 4);
        assert_eq!(updated.thoughts.as_deref(), Some("spice"));
    }

    #[tokio::test]
    async fn add_book_keeps_existing_entry() {
        let store = store();
        let (created, is_new) = store.add_book(Book::new("b1", "Dune")).await.unwrap();
        assert!(is_new);
        assert_eq!(created.status, ReadingStatus::OnQueue);

        store.set_status("b1", ReadingStatus::Read).await.unwrap();
        let (existing, is_new) = store.add_book(Book::new("b1", "Dune")).await.unwrap();
        assert!(!is_new);
        assert_eq!(existing.status, ReadingStatus::Read);
    }

    #[tokio::test]
    async fn list_orders_by_title_and_filters_by_status() {
        let store = store();
        store.upsert_entry(entry("c", "dune")).await.unwrap();
        store.upsert_entry(entry("a", "Anathem")).await.unwrap();
        store.upsert_entry(entry("b", "Dune")).await.unwrap();
        store
            .upsert_entry(entry("d", "Hyperion").with_status(ReadingStatus::Read))
            .await
            .unwrap();

        let all: Vec<String> = store
            .list_entries(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.book.id)
            .collect();
        assert_eq!(all, ["a", "b", "c", "d"]);

        let read = store.list_entries(Some(ReadingStatus::Read)).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].book.id, "d");
    }

    #[tokio::test]
    async fn blank_book_id_is_a_validation_error() {
        let store = store();
        assert!(matches!(
            store.get_entry("  ").await,
            Err(LibraryError::Validation { field: "book_id", .. })
        ));
        assert!(matches!(
            store.upsert_entry(entry("", "Dune")).await,
            Err(LibraryError::Validation { field: "book_id", .. })
        ));
    }

    #[tokio::test]
    async fn blank_thoughts_are_stored_as_absent() {
        let store = store();
        let saved = store
            .upsert_entry(entry("b1", "Dune").with_thoughts("   "))
            .await
            .unwrap();
        assert!(saved.thoughts.is_none());
        assert!(store.get_entry("b1").await.unwrap().unwrap().thoughts.is_none());
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let events = Arc::new(EventBus::default());
        let mut rx = events.subscribe();
        let store = LibraryStore::new(Arc::new(MemoryRepository::new()), events);

        store.upsert_entry(entry("b1", "Dune")).await.unwrap();
        store.set_status("b1", ReadingStatus::Reading).await.unwrap();
        store.delete_entry("b1").await.unwrap();
        store.delete_entry("b1").await.unwrap();

        let saved = rx.recv().await.unwrap();
        assert_eq!(saved.event_type, ENTRY_SAVED);
        assert_eq!(saved.subject.as_deref(), Some("b1"));

        let changed = rx.recv().await.unwrap();
        assert_eq!(changed.event_type, ENTRY_STATUS_CHANGED);
        assert_eq!(changed.payload["from"], "ON_QUEUE");
        assert_eq!(changed.payload["to"], "READING");

        assert_eq!(rx.recv().await.unwrap().event_type, ENTRY_DELETED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_saves_for_one_book_all_land() {
        let store = Arc::new(store());
        store.upsert_entry(entry("b1", "Dune")).await.unwrap();

        let mut tasks = Vec::new();
        for rating in 0..=5 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let current = store.get_entry("b1").await.unwrap().unwrap();
                store.upsert_entry(current.with_rating(rating)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let final_rating = store.get_entry("b1").await.unwrap().unwrap().rating;
        assert!((0..=5).contains(&final_rating));
    }

    #[tokio::test]
    async fn save_edits_keeps_concurrent_changes_to_other_fields() {
        let store = Arc::new(store());
        let baseline = store.upsert_entry(entry("b1", "Dune")).await.unwrap();

        let rating = {
            let (store, baseline) = (store.clone(), baseline.clone());
            tokio::spawn(async move {
                store
                    .save_edits(&baseline, baseline.clone().with_rating(4))
                    .await
            })
        };
        let thoughts = {
            let (store, baseline) = (store.clone(), baseline.clone());
            tokio::spawn(async move {
                store
                    .save_edits(&baseline, baseline.clone().with_thoughts("x"))
                    .await
            })
        };
        rating.await.unwrap().unwrap();
        thoughts.await.unwrap().unwrap();

        let stored = store.get_entry("b1").await.unwrap().unwrap();
        assert_eq!(stored.rating, 4);
        assert_eq!(stored.thoughts.as_deref(), Some("x"));
        assert_eq!(stored.status, ReadingStatus::OnQueue);
    }

    #[tokio::test]
    async fn save_edits_on_deleted_entry_is_not_found() {
        let store = store();
        let baseline = store.upsert_entry(entry("b1", "Dune")).await.unwrap();
        store.delete_entry("b1").await.unwrap();

        assert!(matches!(
            store.save_edits(&baseline, baseline.clone().with_rating(2)).await,
            Err(LibraryError::NotFound { .. })
        ));
        assert!(store.get_entry("b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_survive_reopening_file_storage() {
        let dir = tempfile::tempdir().unwrap();

        {
            let repository = JsonFileRepository::new(dir.path());
            repository.initialize().await.unwrap();
            let store = LibraryStore::new(Arc::new(repository), Arc::new(EventBus::default()));
            store
                .upsert_entry(entry("b1", "Dune").with_rating(3))
                .await
                .unwrap();
        }

        let store = LibraryStore::new(
            Arc::new(JsonFileRepository::new(dir.path())),
            Arc::new(EventBus::default()),
        );
        let entry = store.get_entry("b1").await.unwrap().unwrap();
        assert_eq!(entry.rating, 3);
        assert_eq!(entry.book.title, "Dune");
    }
}
