//! Centralised tracing initialisation for the release binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Pick the default log level for a run.
///
/// Trace mode wins over verbose.
pub fn level_for(trace: bool, verbose: bool) -> Level {
    if trace {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Initialise the global tracing subscriber.
///
/// Logs always go to stderr; stdout is left to the release summary.
/// `level` is the default from [`level_for`] (`--trace` maps to TRACE) and
/// `RUST_LOG` overrides it. With `json` each line is a JSON object carrying
/// the per-target push fields, so interleaved pushes stay attributable.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let json_layer = json.then(|| {
        fmt::layer()
            .with_target(false)
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}
