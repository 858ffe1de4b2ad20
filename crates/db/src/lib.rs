//! Durable keyed document storage.
//!
//! The library store persists its entries through the [`Repository`] trait;
//! [`open`] picks the backend named in the storage settings.

pub mod error;
pub mod file;
pub mod memory;
pub mod repository;

use std::sync::Arc;

use bookworm_kernel::settings::{StorageBackend, StorageSettings};

pub use error::{Result, StorageError};
pub use file::JsonFileRepository;
pub use memory::MemoryRepository;
pub use repository::{Document, Repository};

/// Open the repository configured by `settings`, creating directories as needed.
pub async fn open<T: Document>(settings: &StorageSettings) -> Result<Arc<dyn Repository<T>>> {
    match settings.backend {
        StorageBackend::File => {
            let repository = JsonFileRepository::new(&settings.path);
            repository.initialize().await?;
            tracing::info!(
                target: "bookworm-db",
                path = %repository.root().display(),
                "file storage ready"
            );
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            tracing::warn!(
                target: "bookworm-db",
                "memory storage selected; library entries will not survive a restart"
            );
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}
