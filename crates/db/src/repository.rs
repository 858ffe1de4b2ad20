//! Keyed document repository trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// A document that can be kept in a [`Repository`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Document for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Durable keyed storage for one kind of document.
///
/// A successful `put` or `delete` has reached the backing store when the
/// future resolves. Implementations do not coordinate writers of the same
/// key; callers that need per-key ordering serialize on their side.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Fetch the document stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<T>>;

    /// Insert or replace the document stored under `key`.
    async fn put(&self, key: &str, document: &T) -> Result<()>;

    /// Remove the document stored under `key`.
    ///
    /// # Returns
    /// `true` if a document was removed, `false` if there was nothing to remove
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Every stored document, in no particular order.
    async fn list(&self) -> Result<Vec<T>>;
}

/// Keys are catalog ids; anything empty or oversized is refused up front.
pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be blank",
        });
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is longer than 80 bytes",
        });
    }
    Ok(())
}

const MAX_KEY_LEN: usize = 80;
