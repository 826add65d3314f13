use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Log to stdout, filtered by `RUST_LOG` when set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}
