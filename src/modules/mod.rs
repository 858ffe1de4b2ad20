pub mod catalog;
pub mod library;

use anyhow::Context;
use std::sync::Arc;

use bookworm_events::EventBus;
use bookworm_kernel::{settings::Settings, ModuleRegistry};

use catalog::{Catalog, GoogleBooksClient, SessionLimits};
use library::{LibraryEntry, LibraryStore};

/// Long-lived services shared by the modules
#[derive(Clone)]
pub struct Services {
    pub library: Arc<LibraryStore>,
    pub catalog: Catalog,
    pub session_limits: SessionLimits,
}

/// Open storage and build the catalog client described by `settings`
pub async fn build_services(settings: &Settings, events: Arc<EventBus>) -> anyhow::Result<Services> {
    let repository = bookworm_db::open::<LibraryEntry>(&settings.storage)
        .await
        .with_context(|| format!("failed to open library storage at {}", settings.storage.path))?;

    let client = GoogleBooksClient::new(&settings.catalog)
        .context("failed to build the catalog HTTP client")?;

    Ok(Services {
        library: Arc::new(LibraryStore::new(repository, events)),
        catalog: Catalog::new(Arc::new(client), settings.catalog.page_size),
        session_limits: SessionLimits::from(&settings.catalog),
    })
}

/// Register all project modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, services: &Services) -> anyhow::Result<()> {
    registry.register(library::create_module(services.library.clone()))?;
    registry.register(catalog::create_module(
        services.catalog.clone(),
        services.session_limits,
    ))?;
    Ok(())
}
