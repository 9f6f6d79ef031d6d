//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter directive for the subscriber: `--verbose` wins, then `RUST_LOG`,
/// then the configured level.
pub fn filter_directive(configured: &str, verbose: bool, env: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => configured.to_string(),
    }
}

/// Install the global subscriber, writing to stderr so command output stays
/// clean on stdout.
pub fn init(configured: &str, verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(configured, verbose, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
    if installed.is_ok() {
        tracing::debug!(%directive, "Logging initialised");
    }
}
