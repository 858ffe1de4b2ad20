use anyhow::Context;
use std::sync::Arc;

use bookworm_app::modules;
use bookworm_events::EventBus;
use bookworm_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Bookworm settings")?;
    bookworm_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        storage = ?settings.storage.backend,
        catalog = %settings.catalog.base_url,
        "bookworm-app bootstrap starting"
    );

    let events = Arc::new(EventBus::default());
    let event_sink = events.spawn_tracing_sink();

    let services = modules::build_services(&settings, events.clone()).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &services)?;

    let ctx = InitCtx {
        settings: &settings,
        events: &events,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(
        modules = registry.module_count(),
        "bookworm-app bootstrap complete"
    );

    let served = bookworm_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    event_sink.abort();
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c; shutting down");
    }
    tracing::info!("shutdown signal received");
}
