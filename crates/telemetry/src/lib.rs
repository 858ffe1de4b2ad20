//! Tracing subscriber bootstrap.

use anyhow::Context;
use bookworm_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// The filter comes from `telemetry.filter`, then `RUST_LOG`, then `info`.
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;

    let installed = match settings.log_format {
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(true).try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            target: "bookworm-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }

    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match settings.filter.as_deref() {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid telemetry.filter '{}'", directives)),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_is_used() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Pretty,
            filter: Some("warn,bookworm_app=debug".to_string()),
        };
        let filter = build_filter(&settings).unwrap();
        assert!(filter.to_string().contains("bookworm_app=debug"));
    }

    #[test]
    fn malformed_filter_is_an_error() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Json,
            filter: Some("bookworm_app=loudest".to_string()),
        };
        assert!(build_filter(&settings).is_err());
    }

    #[test]
    fn init_can_run_more_than_once() {
        let settings = TelemetrySettings::default();
        init(&settings).unwrap();
        init(&settings).unwrap();
    }
}
