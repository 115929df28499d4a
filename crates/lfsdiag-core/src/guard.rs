//! Preconditions commands check before doing any work.

use std::io::IsTerminal;
use std::path::Path;

use crate::dispatch::Diagnostics;
use crate::git;

/// Exit status when a command runs outside a repository.
pub const NOT_IN_REPO_EXIT_CODE: i32 = 128;

pub const NOT_IN_REPO_MESSAGE: &str = "Not in a git repository.";

/// Exit status when a command needs piped input but stdin is a terminal.
pub const NO_STDIN_EXIT_CODE: i32 = 1;

/// Exit with status 128 unless `dir` is inside a git work tree.
pub fn require_in_repo(diag: &Diagnostics, dir: &Path) {
    if !git::is_git_repo(dir) {
        diag.print(NOT_IN_REPO_MESSAGE);
        diag.terminate(NOT_IN_REPO_EXIT_CODE);
    }
}

/// Exit with status 1 when stdin is an interactive terminal.
pub fn require_stdin(diag: &Diagnostics, msg: &str) {
    if let Some(line) = stdin_problem(std::io::stdin().is_terminal(), msg) {
        diag.error(line);
        diag.terminate(NO_STDIN_EXIT_CODE);
    }
}

fn stdin_problem(is_terminal: bool, msg: &str) -> Option<String> {
    is_terminal.then(|| format!("Cannot read from STDIN. {msg}"))
}
