//! Book-stats screen state and its reducer.
//!
//! Edits to status, rating and thoughts only change this state. They reach the
//! library store as one [`Effect::Save`] when the reader saves.

use serde::Serialize;

use super::error::{LibraryError, Result};
use super::models::{LibraryEntry, ReadingStatus, MAX_RATING, MIN_RATING};
use crate::modules::catalog::models::Book;
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookStatsEvent {
    LoadStats(Option<String>),
    BackClick,
    DeleteClick,
    ConfirmDelete,
    DismissDialog,
    ConfirmLeave,
    ThoughtsChange(String),
    SetRating(i32),
    StatusChange(ReadingStatus),
    SaveChangesClick,
    Loaded(Option<LibraryEntry>),
    LoadFailed(String),
    Saved(LibraryEntry),
    SaveFailed { book_id: String, message: String },
    Deleted,
    DeleteFailed(String),
}

/// Work the reducer asks its driver to perform against the library store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Load(String),
    /// Write the fields of `edited` that differ from `baseline`.
    Save {
        baseline: LibraryEntry,
        edited: LibraryEntry,
    },
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BookStatsState {
    pub is_loading: bool,
    pub book: Option<Book>,
    pub status: ReadingStatus,
    pub rating: i32,
    pub thoughts: String,
    pub has_changes: bool,
    pub saving_changes: bool,
    pub show_delete_dialog: bool,
    pub show_leave_dialog: bool,
    /// The reader navigated away; nothing more will be shown.
    pub closed: bool,
    pub last_error: Option<String>,
    /// Entry as last loaded or saved.
    #[serde(skip)]
    baseline: Option<LibraryEntry>,
}

impl BookStatsState {
    pub fn baseline(&self) -> Option<&LibraryEntry> {
        self.baseline.as_ref()
    }

    /// The entry the current edits describe.
    pub fn pending_entry(&self) -> Option<LibraryEntry> {
        self.baseline.as_ref().map(|baseline| LibraryEntry {
            book: baseline.book.clone(),
            status: self.status,
            rating: self.rating,
            thoughts: utils::non_blank(Some(self.thoughts.clone())),
        })
    }

    pub fn apply(&mut self, event: BookStatsEvent) -> Result<Option<Effect>> {
        let effect = match event {
            BookStatsEvent::LoadStats(None) => {
                *self = Self::default();
                None
            }
            BookStatsEvent::LoadStats(Some(book_id)) => {
                *self = Self {
                    is_loading: true,
                    ..Self::default()
                };
                Some(Effect::Load(book_id))
            }
            BookStatsEvent::Loaded(entry) => {
                self.is_loading = false;
                self.reset_to(entry);
                None
            }
            BookStatsEvent::LoadFailed(message) => {
                self.is_loading = false;
                self.last_error = Some(message);
                None
            }
            BookStatsEvent::BackClick => {
                if self.has_changes {
                    self.show_leave_dialog = true;
                } else {
                    self.closed = true;
                }
                None
            }
            BookStatsEvent::ConfirmLeave => {
                let baseline = self.baseline.take();
                self.reset_to(baseline);
                self.show_leave_dialog = false;
                self.closed = true;
                None
            }
            BookStatsEvent::DeleteClick => {
                self.loaded_id()?;
                self.show_delete_dialog = true;
                None
            }
            BookStatsEvent::ConfirmDelete => {
                let book_id = self.loaded_id()?;
                self.show_delete_dialog = false;
                Some(Effect::Delete(book_id))
            }
            BookStatsEvent::Deleted => {
                self.reset_to(None);
                self.closed = true;
                None
            }
            BookStatsEvent::DeleteFailed(message) => {
                self.last_error = Some(message);
                None
            }
            BookStatsEvent::DismissDialog => {
                self.show_delete_dialog = false;
                self.show_leave_dialog = false;
                None
            }
            BookStatsEvent::ThoughtsChange(thoughts) => {
                self.thoughts = thoughts;
                self.refresh_changes();
                None
            }
            BookStatsEvent::SetRating(rating) => {
                if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                    return Err(LibraryError::validation(
                        "rating",
                        format!(
                            "rating must be between {} and {}, got {}",
                            MIN_RATING, MAX_RATING, rating
                        ),
                    ));
                }
                self.rating = rating;
                self.refresh_changes();
                None
            }
            BookStatsEvent::StatusChange(status) => {
                self.status = status;
                self.refresh_changes();
                None
            }
            BookStatsEvent::SaveChangesClick => {
                let book_id = self.loaded_id()?;
                if self.saving_changes {
                    return Err(LibraryError::SaveInProgress { book_id });
                }
                let edited = self.pending_entry().filter(|_| self.has_changes);
                match (self.baseline.clone(), edited) {
                    (Some(baseline), Some(edited)) => {
                        self.saving_changes = true;
                        self.last_error = None;
                        Some(Effect::Save { baseline, edited })
                    }
                    _ => None,
                }
            }
            BookStatsEvent::Saved(entry) if !self.is_showing(&entry.book.id) => {
                tracing::debug!(book_id = %entry.book.id, "ignoring save completion for another book");
                None
            }
            BookStatsEvent::Saved(entry) => {
                self.saving_changes = false;
                self.adopt_untouched(&entry);
                self.book = Some(entry.book.clone());
                self.baseline = Some(entry);
                self.refresh_changes();
                None
            }
            BookStatsEvent::SaveFailed { book_id, .. } if !self.is_showing(&book_id) => None,
            BookStatsEvent::SaveFailed { message, .. } => {
                self.saving_changes = false;
                self.last_error = Some(message);
                None
            }
        };
        Ok(effect)
    }

    fn loaded_id(&self) -> Result<String> {
        self.baseline
            .as_ref()
            .map(|entry| entry.book.id.clone())
            .ok_or(LibraryError::NothingLoaded)
    }

    /// Fields still showing the old baseline take the stored value, which may carry
    /// changes saved elsewhere.
    fn adopt_untouched(&mut self, saved: &LibraryEntry) {
        let Some(old) = &self.baseline else {
            return;
        };
        if self.status == old.status {
            self.status = saved.status;
        }
        if self.rating == old.rating {
            self.rating = saved.rating;
        }
        if utils::non_blank(Some(self.thoughts.clone())) == old.thoughts {
            self.thoughts = saved.thoughts.clone().unwrap_or_default();
        }
    }

    fn is_showing(&self, book_id: &str) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|entry| entry.book.id == book_id)
    }

    /// Show `entry` with no pending edits.
    fn reset_to(&mut self, entry: Option<LibraryEntry>) {
        match &entry {
            Some(entry) => {
                self.book = Some(entry.book.clone());
                self.status = entry.status;
                self.rating = entry.rating;
                self.thoughts = entry.thoughts.clone().unwrap_or_default();
            }
            None => {
                self.book = None;
                self.status = ReadingStatus::default();
                self.rating = MIN_RATING;
                self.thoughts.clear();
            }
        }
        self.baseline = entry;
        self.has_changes = false;
    }

    /// Edits are compared field by field with the baseline, so undoing an edit clears the flag.
    fn refresh_changes(&mut self) {
        self.has_changes = match (&self.baseline, self.pending_entry()) {
            (Some(baseline), Some(pending)) => {
                baseline.status != pending.status
                    || baseline.rating != pending.rating
                    || baseline.thoughts != pending.thoughts
            }
            _ => false,
        };
    }
}
