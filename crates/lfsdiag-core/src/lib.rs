//! lfsdiag Core Library
//!
//! Diagnostic capture and crash reporting for command-line programs:
//! everything printed through [`Diagnostics`] is mirrored into a transcript,
//! errors are classified as fatal or recoverable, and fatal errors produce a
//! self-contained panic log before the process exits with status 2.

pub mod classify;
pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fakes;
pub mod git;
pub mod guard;
pub mod host;
pub mod logs;
pub mod metrics;
pub mod panic_log;
pub mod report;
pub mod sink;
pub mod telemetry;
pub mod transcript;

pub use classify::{classify, Outcome, EXIT_CODE};
pub use cleanup::{clear_temp_objects, TEMP_OBJECT_MAX_AGE};
pub use config::DiagConfig;
pub use dispatch::{Diagnostics, Report};
pub use error::{DiagError, Result};
pub use git::{git_dir, git_version, is_git_repo};
pub use guard::{require_in_repo, require_stdin};
pub use host::{Host, SystemHost};
pub use logs::{clear_logs, last_log, list_logs, read_log, LogEntry};
pub use metrics::Metrics;
pub use panic_log::{LogRecord, PanicLogger};
pub use report::{DiagnosticContext, Reportable, WrappedError};
pub use sink::{DualSink, Stream};
pub use telemetry::init_tracing;
pub use transcript::Transcript;

/// lfsdiag version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
