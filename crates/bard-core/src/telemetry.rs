//! Log setup shared by `bard`, `bard-metrics` and `bard-schema-gen`.
//!
//! `bard` prints the engine command line on stdout and the engine inherits
//! that stream, so every log line goes to stderr instead. Wrappers that
//! capture stdout then see only what the pipeline itself wrote.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins over `level` when set. With `json` each event is one JSON
/// object per line, for log shippers on the hosted runner. A subscriber that
/// is already installed is left alone.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

/// `-v` means debug, otherwise info.
pub fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}
