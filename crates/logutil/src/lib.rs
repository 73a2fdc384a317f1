//! Utilities for logging.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Initialize a global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise defaults to `info` (or `debug`
/// with `verbose`). Safe to call more than once; later calls are no-ops,
/// which lets every test set up logging without coordination.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
