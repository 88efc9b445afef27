//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Directive used by `--debug`
pub const DEBUG_DIRECTIVE: &str = "branchboard=debug,branchboard_cli=debug";

const FALLBACK_DIRECTIVE: &str = "warn";

/// Pick the filter: RUST_LOG, then `--debug`, then the configured level.
/// An unparsable configured level falls back to `warn`.
pub fn filter(rust_log: Option<&str>, debug: bool, configured: &str) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    if debug {
        return EnvFilter::new(DEBUG_DIRECTIVE);
    }
    EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

/// Install the global subscriber, writing plain text to stderr
pub fn init(debug: bool, configured: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter(rust_log.as_deref(), debug, configured);
    // A second install (tests running in one process) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}
