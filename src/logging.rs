//! Logging init: structured `tracing` output to stderr.
//!
//! Stdout is reserved for command results so they can be piped; diagnostics
//! go to stderr. The filter honours `RUST_LOG` and defaults to
//! `info,pythonz=debug` (or `warn` with `--quiet`).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,pythonz=debug";
const QUIET_FILTER: &str = "warn";

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_logging(quiet: bool) {
    let fallback = if quiet { QUIET_FILTER } else { DEFAULT_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
