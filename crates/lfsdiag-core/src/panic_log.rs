//! Panic log composition and persistence.
//!
//! A panic log is a plain-text, write-once record. Its body always has the
//! same section order:
//!
//! ```text
//! <version descriptor>
//! <git version | Error getting git version: ...>
//!
//! $ <program> <args...>
//!
//! <transcript>
//!
//! <error message>
//! <inner description>       \
//! key=value ...              > when the error carries diagnostics
//! <stack>                   /   (otherwise a stack captured while logging)
//!
//! ENV:
//! KEY=VALUE ...
//! ```
//!
//! Files are named by local timestamp with nanosecond precision. When the
//! directory or file cannot be created the body goes to the real error stream
//! instead, after a one-line warning; nothing is dropped.

use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::host::Host;
use crate::report::Reportable;
use crate::transcript::Transcript;

/// Extension of every panic log file.
pub const LOG_EXTENSION: &str = "log";

/// Upper bound on `-N` suffixes tried for same-timestamp collisions.
const MAX_NAME_ATTEMPTS: u32 = 64;

/// Everything that goes into one panic log.
pub struct LogRecord<'a> {
    pub version_desc: String,
    pub vcs_version: Result<String>,
    pub argv: Vec<String>,
    pub transcript: Vec<u8>,
    pub error: &'a dyn Reportable,
    pub environ: Vec<String>,
}

impl<'a> LogRecord<'a> {
    /// Snapshot host facts and the transcript as of now.
    pub fn capture(host: &dyn Host, transcript: &Transcript, error: &'a dyn Reportable) -> Self {
        Self {
            version_desc: host.version_desc(),
            vcs_version: host.vcs_version(),
            argv: host.argv(),
            transcript: transcript.contents(),
            error,
            environ: host.environ(),
        }
    }

    /// Write the body in its fixed section order.
    pub fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.version_desc)?;
        match &self.vcs_version {
            Ok(version) => writeln!(w, "{version}")?,
            Err(err) => writeln!(w, "Error getting git version: {err}")?,
        }

        writeln!(w)?;
        writeln!(w, "{}", command_line(&self.argv))?;
        writeln!(w)?;

        write_block(w, &self.transcript)?;
        writeln!(w)?;

        writeln!(w, "{}", self.error)?;
        match self.error.diagnostics() {
            Some(diag) => {
                writeln!(w, "{}", self.error.inner_summary())?;
                for (key, value) in diag.context() {
                    writeln!(w, "{key}={value}")?;
                }
                write_block(w, &diag.stack())?;
            }
            None => write_block(w, Backtrace::force_capture().to_string().as_bytes())?,
        }

        writeln!(w)?;
        writeln!(w, "ENV:")?;
        for var in &self.environ {
            writeln!(w, "{var}")?;
        }
        Ok(())
    }

    /// Render the body to a string.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Format argv as `$ <basename of argv[0]> <args...>`.
pub fn command_line(argv: &[String]) -> String {
    let Some((program, args)) = argv.split_first() else {
        return "$".to_string();
    };
    let name = Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.clone());

    if args.is_empty() {
        format!("$ {name}")
    } else {
        format!("$ {name} {}", args.join(" "))
    }
}

/// Timestamp-derived file name, e.g. `20260101T093000.123456789.log`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.{LOG_EXTENSION}", now.format("%Y%m%dT%H%M%S%.9f"))
}

fn write_block(w: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    w.write_all(bytes)?;
    if !bytes.is_empty() && !bytes.ends_with(b"\n") {
        writeln!(w)?;
    }
    Ok(())
}

/// Writes panic logs under one directory.
///
/// Directory and file creation are serialized so concurrent panics neither
/// race on `create_dir_all` nor clobber each other's files.
#[derive(Debug)]
pub struct PanicLogger {
    log_dir: PathBuf,
    lock: Mutex<()>,
}

impl PanicLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Persist `record`, returning the file path, or `None` when the body was
    /// written to `fallback` instead.
    pub fn write(&self, record: &LogRecord<'_>, fallback: &mut dyn Write) -> Option<PathBuf> {
        self.write_at(record, fallback, Local::now())
    }

    /// [`PanicLogger::write`] with the file name taken from `now`.
    pub fn write_at(
        &self,
        record: &LogRecord<'_>,
        fallback: &mut dyn Write,
        now: DateTime<Local>,
    ) -> Option<PathBuf> {
        let opened = {
            let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
            if let Err(err) = fs::create_dir_all(&self.log_dir) {
                tracing::debug!(dir = %self.log_dir.display(), error = %err, "log dir unavailable");
                fall_back(fallback, &self.log_dir, &err, record);
                return None;
            }
            create_log_file(&self.log_dir, now)
        };

        match opened {
            Ok((path, file)) => finish(record, path, BufWriter::new(file), fallback),
            Err((path, err)) => {
                tracing::debug!(path = %path.display(), error = %err, "log file unavailable");
                fall_back(fallback, &path, &err, record);
                None
            }
        }
    }
}

/// Write the body into an opened log file. On failure the partial file is
/// removed and the body goes to `fallback`.
fn finish(
    record: &LogRecord<'_>,
    path: PathBuf,
    mut out: impl Write,
    fallback: &mut dyn Write,
) -> Option<PathBuf> {
    match record.write_to(&mut out).and_then(|()| out.flush()) {
        Ok(()) => Some(path),
        Err(err) => {
            drop(out);
            if let Err(rm) = fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %rm, "partial log not removed");
            }
            fall_back(fallback, &path, &err, record);
            None
        }
    }
}

fn fall_back(fallback: &mut dyn Write, target: &Path, err: &io::Error, record: &LogRecord<'_>) {
    let _ = write!(fallback, "Unable to log panic to {}: {}\n\n", target.display(), err);
    let _ = record.write_to(fallback);
}

/// Create a fresh log file, adding `-N` before the extension on collision.
/// At most [`MAX_NAME_ATTEMPTS`] names are tried.
fn create_log_file(
    dir: &Path,
    now: DateTime<Local>,
) -> std::result::Result<(PathBuf, File), (PathBuf, io::Error)> {
    let base = now.format("%Y%m%dT%H%M%S%.9f").to_string();
    let mut path = dir.join(log_file_name(now));

    for attempt in 1..MAX_NAME_ATTEMPTS {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                path = dir.join(format!("{base}-{attempt}.{LOG_EXTENSION}"));
            }
            Err(err) => return Err((path, err)),
        }
    }

    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => Ok((path, file)),
        Err(err) => Err((path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeHost;
    use crate::report::WrappedError;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn command_line_uses_program_basename() {
        let argv = vec![
            "/usr/local/bin/git-lfs".to_string(),
            "push".to_string(),
            "origin".to_string(),
        ];
        assert_eq!(command_line(&argv), "$ git-lfs push origin");
        assert_eq!(command_line(&["git-lfs".to_string()]), "$ git-lfs");
        assert_eq!(command_line(&[]), "$");
    }

    #[test]
    fn file_name_has_subsecond_precision() {
        let name = log_file_name(fixed_time());
        assert_eq!(name, "20260102T030405.000000000.log");
    }

    #[test]
    fn colliding_names_get_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_log_file(dir.path(), fixed_time()).unwrap();
        let (second, _) = create_log_file(dir.path(), fixed_time()).unwrap();
        let (third, _) = create_log_file(dir.path(), fixed_time()).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("20260102T030405.000000000-1.log"));
        assert!(third.ends_with("20260102T030405.000000000-2.log"));
    }

    #[test]
    fn vcs_lookup_failure_is_recorded_inline() {
        let host = FakeHost::default().with_vcs_error("git not found");
        let err = anyhow::anyhow!("boom");
        let record = LogRecord::capture(&host, &Transcript::new(), &err);

        let body = record.render();
        let second_line = body.lines().nth(1).unwrap();
        assert_eq!(second_line, "Error getting git version: git error: git not found");
    }

    #[test]
    fn diagnostics_replace_generic_stack() {
        let host = FakeHost::default();
        let err = WrappedError::wrap(
            std::io::Error::new(std::io::ErrorKind::Other, "socket closed"),
            "transfer failed",
        )
        .with_context("retry", 3);
        let record = LogRecord::capture(&host, &Transcript::new(), &err);

        let body = record.render();
        let lines: Vec<&str> = body.lines().collect();
        let msg_at = lines.iter().position(|l| *l == "transfer failed").unwrap();
        assert_eq!(lines[msg_at + 1], "socket closed");
        assert_eq!(lines[msg_at + 2], "retry=3");
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = PanicLogger::new(dir.path().join("nested").join("logs"));
        let host = FakeHost::default();
        let err = anyhow::anyhow!("fatal");
        let record = LogRecord::capture(&host, &Transcript::new(), &err);

        let mut fallback = Vec::new();
        let path = logger.write(&record, &mut fallback).expect("log file");

        assert!(path.starts_with(logger.log_dir()));
        assert!(fallback.is_empty());
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("1.0.0\ngit version 2.40\n"));
    }

    #[test]
    fn write_falls_back_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let logger = PanicLogger::new(&blocker);
        let host = FakeHost::default();
        let err = anyhow::anyhow!("fatal");
        let record = LogRecord::capture(&host, &Transcript::new(), &err);

        let mut fallback = Vec::new();
        assert!(logger.write(&record, &mut fallback).is_none());

        let text = String::from_utf8(fallback).unwrap();
        assert!(text.starts_with(&format!("Unable to log panic to {}: ", blocker.display())));
        assert!(text.contains("\nENV:\n"));
    }

    #[test]
    fn write_falls_back_naming_file_when_every_name_is_taken() {
        let dir = tempfile::tempdir().unwrap();
        let base = "20260102T030405.000000000";
        std::fs::write(dir.path().join(format!("{base}.log")), b"").unwrap();
        for n in 1..MAX_NAME_ATTEMPTS {
            std::fs::write(dir.path().join(format!("{base}-{n}.log")), b"").unwrap();
        }

        let logger = PanicLogger::new(dir.path());
        let host = FakeHost::default().with_argv(&["git-lfs", "push"]);
        let err = WrappedError::new("disk full").fatal();
        let transcript = Transcript::new();
        transcript.append(b"uploading\n");
        let record = LogRecord::capture(&host, &transcript, &err);

        let mut fallback = Vec::new();
        assert!(logger.write_at(&record, &mut fallback, fixed_time()).is_none());

        let last = dir.path().join(format!("{base}-{}.log", MAX_NAME_ATTEMPTS - 1));
        let text = String::from_utf8(fallback).unwrap();
        assert!(text.starts_with(&format!("Unable to log panic to {}: ", last.display())));
        for section in ["1.0.0\n", "\n$ git-lfs push\n", "\nuploading\n", "\ndisk full\n", "\nENV:\n"] {
            assert!(text.contains(section), "missing {section:?} in {text}");
        }
        assert_eq!(
            std::fs::read_dir(dir.path()).unwrap().count(),
            MAX_NAME_ATTEMPTS as usize
        );
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_body_write_removes_partial_file_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.log");
        std::fs::write(&path, b"1.0.0\n").unwrap();

        let host = FakeHost::default();
        let err = anyhow::anyhow!("fatal");
        let record = LogRecord::capture(&host, &Transcript::new(), &err);

        let mut fallback = Vec::new();
        assert!(finish(&record, path.clone(), Broken, &mut fallback).is_none());

        assert!(!path.exists());
        let text = String::from_utf8(fallback).unwrap();
        assert!(text.starts_with(&format!(
            "Unable to log panic to {}: device full\n\n1.0.0\n",
            path.display()
        )));
        assert!(text.contains("\nfatal\n"));
        assert!(text.contains("\nENV:\n"));
    }
}
