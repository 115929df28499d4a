//! Git queries used for the panic log header and for locating the log directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{DiagError, Result};

/// Run `git --version` and return its trimmed output, e.g. `git version 2.40.1`.
pub fn git_version() -> Result<String> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(|e| DiagError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiagError::Git(format!("git --version failed: {stderr}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve the `.git` directory for the repository containing `dir`.
///
/// Relative answers from `git rev-parse --git-dir` are joined onto `dir`.
pub fn git_dir(dir: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(dir)
        .output()
        .map_err(|e| DiagError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiagError::Git(format!(
            "git rev-parse --git-dir failed: {stderr}"
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if raw.is_empty() {
        return Err(DiagError::Git(
            "git rev-parse --git-dir returned empty output".to_string(),
        ));
    }

    Ok(dir.join(raw))
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
