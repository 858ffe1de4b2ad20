//! In-memory repository backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::repository::{check_key, Document, Repository};

/// Volatile repository used by the `memory` storage backend and by tests.
#[derive(Debug)]
pub struct MemoryRepository<T> {
    documents: RwLock<HashMap<String, T>>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for MemoryRepository<T> {
    async fn get(&self, key: &str) -> Result<Option<T>> {
        check_key(key)?;
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, document: &T) -> Result<()> {
        check_key(key)?;
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(self.documents.write().await.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }
}
