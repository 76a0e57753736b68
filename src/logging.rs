// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Diagnostics via `tracing`, written to stderr.
//!
//! Found programs are printed to stdout by the binary and never go through
//! this subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`, defaulting to `info`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=bf_brute=debug bfbrute search --config hello.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
