use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::error::{LibraryError, Result};
use super::session::{BookStatsEvent, BookStatsState, Effect};
use super::store::LibraryStore;

/// Drives a [`BookStatsState`] against the library store.
///
/// Events are reduced under a short-lived lock; the resulting effect runs after the
/// lock is released and feeds its outcome back as a completion event. Every new
/// state is published on a `watch` channel.
pub struct BookStatsController {
    store: Arc<LibraryStore>,
    state: Mutex<BookStatsState>,
    updates: watch::Sender<BookStatsState>,
}

impl BookStatsController {
    pub fn new(store: Arc<LibraryStore>) -> Self {
        let (updates, _) = watch::channel(BookStatsState::default());
        Self {
            store,
            state: Mutex::new(BookStatsState::default()),
            updates,
        }
    }

    pub fn state(&self) -> BookStatsState {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BookStatsState> {
        self.updates.subscribe()
    }

    pub async fn dispatch(&self, event: BookStatsEvent) -> Result<BookStatsState> {
        if let Some(effect) = self.reduce(event)? {
            self.run(effect).await?;
        }
        Ok(self.state())
    }

    async fn run(&self, effect: Effect) -> Result<()> {
        match effect {
            Effect::Load(book_id) => match self.store.get_entry(&book_id).await {
                Ok(entry) => {
                    let found = entry.is_some();
                    self.reduce(BookStatsEvent::Loaded(entry))?;
                    if found {
                        Ok(())
                    } else {
                        Err(LibraryError::not_found(book_id))
                    }
                }
                Err(err) => {
                    self.reduce(BookStatsEvent::LoadFailed(err.to_string()))?;
                    Err(err)
                }
            },
            Effect::Save { baseline, edited } => {
                let book_id = edited.book.id.clone();
                match self.store.save_edits(&baseline, edited).await {
                    Ok(saved) => {
                        tracing::info!(book_id = %book_id, status = %saved.status, rating = saved.rating, "book stats saved");
                        self.reduce(BookStatsEvent::Saved(saved))?;
                        Ok(())
                    }
                    Err(err) => {
                        tracing::warn!(book_id = %book_id, error = %err, "saving book stats failed");
                        self.reduce(BookStatsEvent::SaveFailed {
                            book_id,
                            message: err.to_string(),
                        })?;
                        Err(err)
                    }
                }
            }
            Effect::Delete(book_id) => match self.store.delete_entry(&book_id).await {
                Ok(_) => {
                    self.reduce(BookStatsEvent::Deleted)?;
                    Ok(())
                }
                Err(err) => {
                    self.reduce(BookStatsEvent::DeleteFailed(err.to_string()))?;
                    Err(err)
                }
            },
        }
    }

    fn reduce(&self, event: BookStatsEvent) -> Result<Option<Effect>> {
        let mut state = self.lock();
        let effect = state.apply(event)?;
        self.updates.send_replace(state.clone());
        Ok(effect)
    }

    fn lock(&self) -> MutexGuard<'_, BookStatsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::models::Book;
    use crate::modules::library::models::{LibraryEntry, ReadingStatus};
    use bookworm_db::MemoryRepository;
    use bookworm_events::EventBus;

    async fn store_with_b1() -> Arc<LibraryStore> {
        let store = Arc::new(LibraryStore::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(EventBus::default()),
        ));
        store
            .upsert_entry(LibraryEntry::new(Book::new("b1", "Dune")))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn edits_persist_only_on_save() {
        let store = store_with_b1().await;
        let controller = BookStatsController::new(store.clone());

        controller
            .dispatch(BookStatsEvent::LoadStats(Some("b1".to_string())))
            .await
            .unwrap();
        controller
            .dispatch(BookStatsEvent::StatusChange(ReadingStatus::Read))
            .await
            .unwrap();
        let state = controller
            .dispatch(BookStatsEvent::SetRating(4))
            .await
            .unwrap();
        assert!(state.has_changes);

        let stored = store.get_entry("b1").await.unwrap().unwrap();
        assert_eq!(stored.status, ReadingStatus::OnQueue);
        assert_eq!(stored.rating, 0);

        let saved = controller
            .dispatch(BookStatsEvent::SaveChangesClick)
            .await
            .unwrap();
        assert!(!saved.has_changes);
        assert!(!saved.saving_changes);

        let stored = store.get_entry("b1").await.unwrap().unwrap();
        assert_eq!(stored.status, ReadingStatus::Read);
        assert_eq!(stored.rating, 4);
    }

    #[tokio::test]
    async fn loading_a_missing_book_is_not_found() {
        let store = store_with_b1().await;
        let controller = BookStatsController::new(store);

        let err = controller
            .dispatch(BookStatsEvent::LoadStats(Some("ghost".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
        assert!(!controller.state().is_loading);
        assert!(controller.state().book.is_none());
    }

    #[tokio::test]
    async fn confirmed_delete_removes_entry() {
        let store = store_with_b1().await;
        let controller = BookStatsController::new(store.clone());

        controller
            .dispatch(BookStatsEvent::LoadStats(Some("b1".to_string())))
            .await
            .unwrap();
        controller
            .dispatch(BookStatsEvent::DeleteClick)
            .await
            .unwrap();
        assert!(store.get_entry("b1").await.unwrap().is_some());

        let state = controller
            .dispatch(BookStatsEvent::ConfirmDelete)
            .await
            .unwrap();
        assert!(state.closed);
        assert!(store.get_entry("b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscribers_observe_every_step() {
        let store = store_with_b1().await;
        let controller = BookStatsController::new(store);
        let mut rx = controller.subscribe();

        controller
            .dispatch(BookStatsEvent::LoadStats(Some("b1".to_string())))
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.book.map(|b| b.id), Some("b1".to_string()));
        assert!(!seen.is_loading);
    }
}
