//! Version, invocation and environment facts embedded in panic logs.

use crate::error::Result;
use crate::git;

/// Source of the process facts a panic log records.
pub trait Host: Send + Sync {
    /// Program version descriptor, e.g. `lfsdiag/0.3.1 (linux x86_64)`.
    fn version_desc(&self) -> String;

    /// Version of the underlying VCS tool.
    fn vcs_version(&self) -> Result<String>;

    /// Arguments the process was invoked with, program name first.
    fn argv(&self) -> Vec<String>;

    /// One `KEY=VALUE` line per environment variable.
    fn environ(&self) -> Vec<String>;
}

/// The running process.
#[derive(Debug, Clone)]
pub struct SystemHost {
    version_desc: String,
}

impl SystemHost {
    pub fn new(program: &str, version: &str) -> Self {
        Self {
            version_desc: version_desc(program, version),
        }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new("lfsdiag", crate::VERSION)
    }
}

impl Host for SystemHost {
    fn version_desc(&self) -> String {
        self.version_desc.clone()
    }

    fn vcs_version(&self) -> Result<String> {
        git::git_version()
    }

    fn argv(&self) -> Vec<String> {
        std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn environ(&self) -> Vec<String> {
        let mut vars: Vec<String> = std::env::vars_os()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect();
        vars.sort();
        vars
    }
}

/// Format `<program>/<version> (<os> <arch>)`.
pub fn version_desc(program: &str, version: &str) -> String {
    format!(
        "{program}/{version} ({} {})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
