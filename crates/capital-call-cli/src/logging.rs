//! Diagnostic logging for the CLI.
//!
//! Logs go to stderr so stdout stays clean for the formatted result.
//! `RUST_LOG` takes precedence over the `-v` flags:
//!
//! ```bash
//! RUST_LOG=capital_call=debug ccall call --input call.json
//! ```

use clap::ValueEnum;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Log line format.
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum LogFormat {
    /// Compact single-line format
    #[default]
    Compact,
    /// JSON lines (for log aggregation)
    Json,
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(verbosity: u8, format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let layer = match format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    // Already installed when called twice.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
