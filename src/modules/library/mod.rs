pub mod controller;
mod docs;
pub mod error;
pub mod models;
mod routes;
pub mod session;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;

use bookworm_kernel::{InitCtx, Module};

pub use controller::BookStatsController;
pub use error::LibraryError;
pub use models::{LibraryEntry, ReadingStatus};
pub use session::{BookStatsEvent, BookStatsState, Effect};
pub use store::LibraryStore;

/// The reader's library: shelves, ratings and thoughts
pub struct LibraryModule {
    store: Arc<LibraryStore>,
}

impl LibraryModule {
    pub fn new(store: Arc<LibraryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for LibraryModule {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.storage.backend,
            "library module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(docs::openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let entries = self.store.list_entries(None).await?.len();
        tracing::info!(module = self.name(), entries, "library module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "library module stopped");
        Ok(())
    }
}

/// Create the library module over a shared store
pub fn create_module(store: Arc<LibraryStore>) -> Arc<dyn Module> {
    Arc::new(LibraryModule::new(store))
}
