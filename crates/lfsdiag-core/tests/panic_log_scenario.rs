//! End-to-end panic log bodies written through the dispatch surface.

use std::sync::Arc;

use lfsdiag_core::fakes::{FakeHost, MemoryStream};
use lfsdiag_core::{list_logs, DiagConfig, Diagnostics, Outcome, Stream, WrappedError};

struct Fixture {
    diag: Diagnostics,
    stderr: MemoryStream,
    dir: tempfile::TempDir,
}

fn fixture(host: FakeHost) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = DiagConfig::new(dir.path().join("lfs").join("logs")).with_program("git lfs");
    let stderr = MemoryStream::new();
    let diag = Diagnostics::with_streams(
        config,
        Arc::new(host),
        Stream::new(MemoryStream::new()),
        Stream::new(stderr.clone()),
    );
    Fixture { diag, stderr, dir }
}

fn push_host() -> FakeHost {
    FakeHost::new("1.0.0")
        .with_argv(&["git-lfs", "push", "origin"])
        .with_environ(&["GIT_DIR=.git", "HOME=/home/user"])
}

#[test]
fn fatal_plain_error_scenario_body() {
    let f = fixture(push_host());
    f.diag.print("uploading file");

    let err = anyhow::anyhow!("network unreachable");
    let path = f
        .diag
        .logged_error(Some(&err), "network unreachable")
        .expect("log file written");
    let body = std::fs::read_to_string(&path).expect("read log");

    let expected_head = "1.0.0\n\
                         git version 2.40\n\
                         \n\
                         $ git-lfs push origin\n\
                         \n\
                         uploading file\n\
                         network unreachable\n\
                         \n\
                         network unreachable\n";
    assert!(
        body.starts_with(expected_head),
        "unexpected head:\n{body}"
    );
    assert!(body.ends_with("\nENV:\nGIT_DIR=.git\nHOME=/home/user\n"));
}

#[test]
fn scenario_body_without_error_line_in_transcript() {
    let f = fixture(push_host());
    f.diag.print("uploading file");

    let err = anyhow::anyhow!("network unreachable");
    let record = lfsdiag_core::LogRecord::capture(f.diag.host(), f.diag.transcript(), &err);
    let body = record.render();

    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        &lines[..8],
        &[
            "1.0.0",
            "git version 2.40",
            "",
            "$ git-lfs push origin",
            "",
            "uploading file",
            "",
            "network unreachable",
        ]
    );
    let env_at = lines.iter().position(|l| *l == "ENV:").expect("ENV marker");
    assert!(env_at > 8, "generic stack capture expected before ENV:");
    assert_eq!(lines[env_at - 1], "");
    assert_eq!(&lines[env_at + 1..], &["GIT_DIR=.git", "HOME=/home/user"]);
}

#[test]
fn context_pairs_are_written_as_key_value_lines() {
    let f = fixture(push_host());
    let err = WrappedError::new("batch api failed")
        .fatal()
        .with_context("retry", "3");

    let report = f.diag.report(&err);
    assert_eq!(report.outcome, Outcome::Fatal);

    let body = std::fs::read_to_string(report.log_path.expect("log file")).expect("read log");
    assert!(body.lines().any(|l| l == "retry=3"), "body:\n{body}");
}

#[test]
fn fatal_error_produces_exactly_one_log() {
    let f = fixture(push_host());
    let err = WrappedError::new("corrupt pointer").fatal();

    let report = f.diag.report(&err);
    assert_eq!(report.exit_code(), 2);

    let logs = list_logs(f.diag.log_dir()).expect("list logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(Some(logs[0].path.clone()), report.log_path);
}

#[test]
fn recoverable_plain_error_prints_one_line_and_no_log() {
    let f = fixture(push_host());
    let err = anyhow::anyhow!("remote rejected push");

    let report = f.diag.report(&err);
    assert_eq!(report.outcome, Outcome::Recoverable { inner: None });
    assert_eq!(report.exit_code(), 2);
    assert_eq!(f.stderr.contents(), "remote rejected push\n");
    assert!(list_logs(f.diag.log_dir()).expect("list logs").is_empty());
}

#[test]
fn uncreatable_log_dir_falls_back_to_stderr_with_every_section() {
    let f = fixture(push_host());
    let blocker = f.dir.path().join("blocker");
    std::fs::write(&blocker, b"regular file").expect("write blocker");

    let config = f.diag.config().clone().with_log_dir(&blocker);
    let stderr = MemoryStream::new();
    let diag = Diagnostics::with_streams(
        config,
        Arc::new(push_host()),
        Stream::new(MemoryStream::new()),
        Stream::new(stderr.clone()),
    );
    diag.print("uploading file");

    let err = WrappedError::new("network unreachable").fatal();
    let report = diag.report(&err);
    assert!(report.log_path.is_none());
    assert_eq!(diag.metrics().log_fallbacks(), 1);

    let out = stderr.contents();
    let warning = format!("Unable to log panic to {}: ", blocker.display());
    assert!(out.contains(&warning), "stderr:\n{out}");
    for section in [
        "1.0.0\n",
        "git version 2.40\n",
        "$ git-lfs push origin\n",
        "uploading file\n",
        "network unreachable\n",
        "\nENV:\n",
        "HOME=/home/user\n",
    ] {
        assert!(out.contains(section), "missing {section:?} in:\n{out}");
    }
    assert!(!out.contains("Errors logged to"));
}

#[test]
fn logged_error_never_terminates() {
    let f = fixture(push_host());
    assert!(f.diag.logged_error(None, "nothing to log").is_none());

    let err = anyhow::anyhow!("still running");
    assert!(f.diag.logged_error(Some(&err), "logged").is_some());

    // Reaching this point means neither call exited the process.
    f.diag.print("after");
    assert!(f.diag.transcript().contents().ends_with(b"after\n"));
    assert!(f
        .stderr
        .contents()
        .contains("Use `git lfs logs last` to view the log."));
}
