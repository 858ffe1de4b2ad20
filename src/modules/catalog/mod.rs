pub mod client;
mod docs;
pub mod error;
pub mod google;
pub mod models;
mod routes;
pub mod search;
pub mod session;
pub mod session_store;

use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;

use bookworm_kernel::{InitCtx, Module};

pub use client::{CatalogClient, CatalogRequest};
pub use error::SearchError;
pub use google::GoogleBooksClient;
pub use search::Catalog;
pub use session::{LoadState, SearchSession, SearchSnapshot, SessionPageToken};
pub use session_store::{SessionLimits, SessionStore};

use routes::{CatalogState, Sessions};

/// Catalog search, stateless and through server-held search sessions
pub struct CatalogModule {
    catalog: Catalog,
    sessions: Sessions,
}

impl CatalogModule {
    pub fn new(catalog: Catalog, limits: SessionLimits) -> Self {
        Self {
            catalog,
            sessions: Arc::new(SessionStore::new(limits)),
        }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            base_url = %ctx.settings.catalog.base_url,
            page_size = self.catalog.page_size(),
            api_key = ctx.settings.catalog.api_key.is_some(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(CatalogState {
            catalog: self.catalog.clone(),
            sessions: self.sessions.clone(),
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(docs::openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let open = self.sessions.clear();
        tracing::info!(module = self.name(), dropped_sessions = open, "catalog module stopped");
        Ok(())
    }
}

/// Create the catalog module over an already configured [`Catalog`]
pub fn create_module(catalog: Catalog, limits: SessionLimits) -> Arc<dyn Module> {
    Arc::new(CatalogModule::new(catalog, limits))
}
