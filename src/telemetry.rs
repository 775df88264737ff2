//! Logging setup for embedders of the library.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. [`crate::config::DEFAULT_LOG_LEVEL`]).
///
/// Safe to call more than once; later calls are no-ops. Returns whether
/// this call installed the subscriber.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let _ = init_tracing("insight_atlas=debug");
        assert!(!init_tracing("insight_atlas=info"));
    }
}
