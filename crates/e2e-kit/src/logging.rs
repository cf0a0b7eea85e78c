//! Diagnostic logging for test processes.
//!
//! Respects `RUST_LOG`; otherwise `warn`, or `debug` when `DEBUG=true`.
//! Writes to stderr so it never mixes with the step line on stdout.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub fn default_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let debug = std::env::var("DEBUG").is_ok_and(|v| v == "true");
    init_with(debug);
}

/// Install the global subscriber with an explicit debug flag
pub fn init_with(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
