//! In-memory fakes for the host and output streams (testing only)
//!
//! `FakeHost` returns fixed version, argv and environment values so panic log
//! bodies are deterministic. `MemoryStream` stands in for stdout/stderr.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::error::{DiagError, Result};
use crate::host::Host;

/// Host with fixed facts.
#[derive(Debug, Clone)]
pub struct FakeHost {
    pub version_desc: String,
    pub vcs_version: std::result::Result<String, String>,
    pub argv: Vec<String>,
    pub environ: Vec<String>,
}

impl FakeHost {
    pub fn new(version_desc: impl Into<String>) -> Self {
        Self {
            version_desc: version_desc.into(),
            vcs_version: Ok("git version 2.40".to_string()),
            argv: vec!["git-lfs".to_string()],
            environ: Vec::new(),
        }
    }

    pub fn with_argv(mut self, argv: &[&str]) -> Self {
        self.argv = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_environ(mut self, environ: &[&str]) -> Self {
        self.environ = environ.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_vcs_error(mut self, message: impl Into<String>) -> Self {
        self.vcs_version = Err(message.into());
        self
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new("1.0.0")
    }
}

impl Host for FakeHost {
    fn version_desc(&self) -> String {
        self.version_desc.clone()
    }

    fn vcs_version(&self) -> Result<String> {
        self.vcs_version.clone().map_err(DiagError::Git)
    }

    fn argv(&self) -> Vec<String> {
        self.argv.clone()
    }

    fn environ(&self) -> Vec<String> {
        self.environ.clone()
    }
}

/// Growable in-memory writer whose clones share the same bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
