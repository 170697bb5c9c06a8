//! Logging setup based on `tracing-subscriber`.
//!
//! The kernel itself only emits `tracing` events. Applications and examples
//! call [`init`] once at startup to print them.

/// Default filter: kernel crates at `debug`, everything else at `info`.
pub const DEFAULT_FILTER: &str = "info,grapple=debug,grapple_core=debug";

/// Install a global fmt subscriber using [`DEFAULT_FILTER`], unless `RUST_LOG`
/// is set.
pub fn init() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    init_with_filter(&filter);
}

/// Install a global fmt subscriber with an explicit filter directive.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();

    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
