//! Diagnostic logging.
//!
//! Library events go to stderr through a `tracing-subscriber` fmt subscriber.
//! The subscriber is built here and installed by `main` as the default for
//! the duration of the run only.

use crate::context::VerbosityLevel;
use tracing_subscriber::EnvFilter;

/// Filter directives for a verbosity level.
///
/// `--debug` echoes response bodies, which the library logs at info level,
/// so it raises the library to at least info.
pub fn filter_directives(verbosity: VerbosityLevel, debug: bool) -> String {
    let level = match verbosity {
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "info",
        VerbosityLevel::VeryVerbose => "debug",
        VerbosityLevel::Trace => "trace",
    };

    if debug && verbosity == VerbosityLevel::Normal {
        format!("{level},libsweep=info")
    } else {
        level.to_string()
    }
}

/// Build the subscriber. `RUST_LOG`, when set and valid, replaces the
/// computed filter.
pub fn subscriber(
    verbosity: VerbosityLevel,
    debug: bool,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity, debug)));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(verbosity >= VerbosityLevel::VeryVerbose)
        .finish()
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
