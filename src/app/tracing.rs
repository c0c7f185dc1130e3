use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber at `level`, refined by `RUST_LOG`.
/// Uses JSON format when `RUST_LOG_FORMAT=json` (the default).
pub fn init_tracing(level: Level) {
    let use_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(true);

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if use_json {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
