//! Process-wide diagnostics configuration.
//!
//! Values come from the environment with repository-relative defaults:
//!
//! | Variable            | Meaning                              | Default                  |
//! |---------------------|--------------------------------------|--------------------------|
//! | `LFSDIAG_LOG_DIR`   | where panic logs are written         | `<git-dir>/lfs/logs`     |
//! | `LFSDIAG_TMP_DIR`   | temp objects cleared at shutdown     | `<git-dir>/lfs/tmp`      |
//! | `LFSDIAG_DEBUG`     | escalate every error to a panic log  | `false`                  |
//! | `LFSDIAG_LOG_STATS` | emit the stats line after dispatch   | `false`                  |

use std::path::{Path, PathBuf};

use crate::git;

pub const LOG_DIR_ENV: &str = "LFSDIAG_LOG_DIR";
pub const TMP_DIR_ENV: &str = "LFSDIAG_TMP_DIR";
pub const DEBUG_ENV: &str = "LFSDIAG_DEBUG";
pub const LOG_STATS_ENV: &str = "LFSDIAG_LOG_STATS";

/// Settings for a [`crate::Diagnostics`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagConfig {
    /// Directory panic logs are written to; created on first use.
    pub log_dir: PathBuf,
    /// Directory whose stale files are removed by the shutdown cleanup hook.
    pub tmp_dir: PathBuf,
    /// Set once at startup; escalates every reported error to the panic path.
    pub debugging: bool,
    /// Emit counters through `tracing` when dispatch finishes.
    pub log_stats: bool,
    /// Command name used in the "view the log" hint.
    pub program: String,
}

impl DiagConfig {
    /// Config rooted at an explicit log directory; `tmp_dir` is its sibling `tmp`.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        let tmp_dir = log_dir
            .parent()
            .map(|p| p.join("tmp"))
            .unwrap_or_else(|| PathBuf::from("tmp"));
        Self {
            log_dir,
            tmp_dir,
            debugging: false,
            log_stats: false,
            program: "lfsdiag".to_string(),
        }
    }

    /// Build from the environment, resolving defaults against the repository
    /// containing `cwd`.
    pub fn from_env(cwd: &Path) -> Self {
        let lfs_dir = git::git_dir(cwd)
            .unwrap_or_else(|_| cwd.join(".git"))
            .join("lfs");

        let log_dir = env_path(LOG_DIR_ENV).unwrap_or_else(|| lfs_dir.join("logs"));
        let tmp_dir = env_path(TMP_DIR_ENV).unwrap_or_else(|| lfs_dir.join("tmp"));

        Self {
            log_dir,
            tmp_dir,
            debugging: env_bool(DEBUG_ENV, false),
            log_stats: env_bool(LOG_STATS_ENV, false),
            program: "lfsdiag".to_string(),
        }
    }

    pub fn with_debugging(mut self, debugging: bool) -> Self {
        self.debugging = debugging;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Read a boolean variable. Accepts "1", "true", "yes", "on" (case-insensitive);
/// any other set value is false, unset returns `default`.
pub fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => parse_bool(&val),
        Err(_) => default,
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
