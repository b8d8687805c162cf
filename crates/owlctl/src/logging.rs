//! Tracing setup for owlctl.
//!
//! Filter priority: `--verbose` (debug), then $OWLMIND_LOG, then the config
//! `log.level`. Logs go to stderr so stdout stays parseable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "OWLMIND_LOG";

pub fn filter(level: &str, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init(level: &str, verbose: bool) {
    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
