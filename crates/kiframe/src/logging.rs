//! Log subscriber setup for the binaries.
//!
//! `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}
