use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. Respects `RUST_LOG`; defaults to
/// info-level output. Safe to call once per process.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
