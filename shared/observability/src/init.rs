//! Tracing initialization shared by every service binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes a global tracing subscriber for `service_name`, honoring
/// `LOG_LEVEL` (falling back to `RUST_LOG`, then `info`). JSON formatting is
/// used when `LOG_FORMAT=json`; otherwise a human-readable format is used,
/// matching the two formats the teacher's own observability crate supports.
pub fn init_tracing_for(service_name: &str) {
    let level = std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }

    tracing::info!(service = service_name, "tracing initialized");
}
