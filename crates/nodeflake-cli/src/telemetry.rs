//! Diagnostics setup for the `nodeflake` binary.
//!
//! Identifiers go to stdout, so every log line is written to stderr. Filtering
//! follows `RUST_LOG` and defaults to `warn`, which surfaces identity clamping
//! without drowning the output of large runs.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
