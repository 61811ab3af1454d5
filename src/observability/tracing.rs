use crate::config::ObservabilityConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false),
            )
            .try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
        return;
    }

    tracing::info!(
        level = %config.log_level,
        format = %config.log_format,
        "Tracing initialized"
    );
}
