//! The entry points the rest of the program reports through.
//!
//! A [`Diagnostics`] value is built once at startup and passed by reference
//! to command code. It owns the transcript, both dual sinks, the panic logger
//! and the debug flag.
//!
//! Terminating entry points (`exit`, `panic`, `exit_with_error`) are thin
//! wrappers: the work happens in non-terminating counterparts (`report`,
//! `logged_error`) and [`Diagnostics::terminate`] is the only place the
//! process exits.

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::classify::{classify, Outcome, EXIT_CODE};
use crate::cleanup::{clear_temp_objects, TEMP_OBJECT_MAX_AGE};
use crate::config::DiagConfig;
use crate::host::{Host, SystemHost};
use crate::metrics::Metrics;
use crate::panic_log::{LogRecord, PanicLogger};
use crate::report::Reportable;
use crate::sink::{DualSink, Stream};
use crate::transcript::Transcript;

/// Result of routing an error through [`Diagnostics::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    /// Where the panic log landed, if it reached a file.
    pub log_path: Option<PathBuf>,
}

impl Report {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// Process-wide diagnostics context.
pub struct Diagnostics {
    config: DiagConfig,
    host: Arc<dyn Host>,
    transcript: Transcript,
    out: DualSink,
    err: DualSink,
    logger: PanicLogger,
    metrics: Metrics,
}

impl Diagnostics {
    /// Diagnostics over the real stdout/stderr and the running process.
    pub fn new(config: DiagConfig) -> Self {
        let host = SystemHost::new(&config.program, crate::VERSION);
        Self::with_streams(config, Arc::new(host), Stream::stdout(), Stream::stderr())
    }

    /// Diagnostics over arbitrary streams and host facts.
    pub fn with_streams(
        config: DiagConfig,
        host: Arc<dyn Host>,
        stdout: Stream,
        stderr: Stream,
    ) -> Self {
        let transcript = Transcript::new();
        Self {
            logger: PanicLogger::new(config.log_dir.clone()),
            out: DualSink::new(stdout, transcript.clone()),
            err: DualSink::new(stderr, transcript.clone()),
            transcript,
            config,
            host,
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &DiagConfig {
        &self.config
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn debugging(&self) -> bool {
        self.config.debugging
    }

    pub fn log_dir(&self) -> &Path {
        self.logger.log_dir()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The stderr dual sink, for wiring into the tracing subscriber.
    pub fn error_sink(&self) -> DualSink {
        self.err.clone()
    }

    /// Print a line to stdout; it is also captured in the transcript.
    pub fn print(&self, msg: impl Display) {
        write_line(&mut self.out.clone(), &msg);
        self.metrics.inc_lines_printed();
    }

    /// Print a line to stderr; it is also captured in the transcript.
    pub fn error(&self, msg: impl Display) {
        write_line(&mut self.err.clone(), &msg);
        self.metrics.inc_error_lines();
    }

    /// Emit a timestamped debug line when debugging is enabled.
    pub fn debug(&self, msg: impl Display) {
        if !self.config.debugging {
            return;
        }
        tracing::debug!("{msg}");
    }

    /// Print `msg` as an error and exit with status 2. No log is written.
    pub fn exit(&self, msg: impl Display) -> ! {
        self.error(msg);
        self.terminate(EXIT_CODE)
    }

    /// Print `msg` as an error and write a panic log for `err` without exiting.
    ///
    /// Returns the log path when it reached a file. A missing error writes
    /// no log.
    pub fn logged_error(&self, err: Option<&dyn Reportable>, msg: impl Display) -> Option<PathBuf> {
        self.error(msg);
        let err = err?;

        let path = self.write_panic_log(err);
        if let Some(path) = &path {
            let _ = write!(
                self.err.real().clone(),
                "\nErrors logged to {}\nUse `{} logs last` to view the log.\n",
                path.display(),
                self.config.program
            );
        }
        path
    }

    /// [`Diagnostics::logged_error`], then exit with status 2.
    pub fn panic(&self, err: &dyn Reportable, msg: impl Display) -> ! {
        self.logged_error(Some(err), msg);
        self.terminate(EXIT_CODE)
    }

    /// Classify `err` and exit on the matching path.
    pub fn exit_with_error(&self, err: &dyn Reportable) -> ! {
        let report = self.report(err);
        self.terminate(report.exit_code())
    }

    /// Everything [`Diagnostics::exit_with_error`] does except exiting.
    pub fn report(&self, err: &dyn Reportable) -> Report {
        let outcome = classify(err, self.config.debugging);
        let log_path = match &outcome {
            Outcome::Fatal => self.logged_error(Some(err), err),
            Outcome::Recoverable { inner } => {
                if let Some(inner) = inner {
                    self.error(inner);
                }
                self.error(err);
                None
            }
        };
        tracing::debug!(?outcome, log = ?log_path, "error reported");
        Report { outcome, log_path }
    }

    /// Write a panic log for `err`, falling back to the real stderr.
    fn write_panic_log(&self, err: &dyn Reportable) -> Option<PathBuf> {
        let record = LogRecord::capture(self.host.as_ref(), &self.transcript, err);
        let path = self.logger.write(&record, &mut self.err.real().clone());
        match &path {
            Some(_) => self.metrics.inc_logs_written(),
            None => self.metrics.inc_log_fallbacks(),
        }
        path
    }

    /// Shutdown hook: remove stale temp objects, reporting (not failing) on error.
    pub fn cleanup(&self) {
        self.cleanup_older_than(TEMP_OBJECT_MAX_AGE);
    }

    pub fn cleanup_older_than(&self, max_age: Duration) {
        match clear_temp_objects(&self.config.tmp_dir, max_age) {
            Ok(removed) => tracing::debug!(removed, dir = %self.config.tmp_dir.display(), "temp objects cleared"),
            Err(e) => {
                let _ = writeln!(
                    self.err.real().clone(),
                    "Error clearing old temp files: {e}"
                );
            }
        }
    }

    /// Statistics hook run after command dispatch.
    pub fn flush_stats(&self) {
        if self.config.log_stats {
            self.metrics.flush();
        }
    }

    /// Flush both real streams and exit with `code`.
    pub fn terminate(&self, code: i32) -> ! {
        let _ = self.out.real().clone().flush();
        let _ = self.err.real().clone().flush();
        std::process::exit(code)
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("config", &self.config)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

fn write_line(sink: &mut DualSink, msg: &dyn Display) {
    let line = format!("{msg}\n");
    let _ = sink.write_all(line.as_bytes());
}
