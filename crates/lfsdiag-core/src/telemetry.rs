//! Centralised tracing initialisation for lfsdiag binaries.
//!
//! Call [`init_tracing`] once at program start, handing it the error dual sink
//! from [`crate::Diagnostics::error_sink`]. Debug lines then reach stderr with a
//! timestamp and are also captured in the transcript, so they show up in any
//! panic log written later.
//!
//! Safe to call more than once; subsequent calls are silently ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::sink::DualSink;

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
/// * `writer`: where formatted lines go.
pub fn init_tracing(json: bool, level: Level, writer: DualSink) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let make_writer = move || writer.clone();

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(make_writer)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(make_writer),
            )
            .try_init()
            .ok();
    }
}
