//! Tracing setup.
//!
//! Logs go to stderr so that CLI output on stdout stays machine-readable.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "statlab=info,tower_http=info";
const VERBOSE_FILTER: &str = "statlab=debug,tower_http=debug";

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
