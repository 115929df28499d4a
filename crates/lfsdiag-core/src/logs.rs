//! Browsing and clearing the panic log directory.
//!
//! Log names start with a `%Y%m%dT%H%M%S` timestamp, so lexical order is
//! chronological order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DiagError, Result};
use crate::panic_log::LOG_EXTENSION;

/// One panic log on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// File name without the `.log` extension.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// All panic logs in `dir`, oldest first. A missing directory has no logs.
pub fn list_logs(dir: &Path) -> Result<Vec<LogEntry>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut logs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        logs.push(LogEntry {
            name: name.to_string(),
            size: meta.len(),
            path,
        });
    }

    logs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(logs)
}

/// The newest panic log.
pub fn last_log(dir: &Path) -> Result<LogEntry> {
    list_logs(dir)?
        .pop()
        .ok_or_else(|| DiagError::NoLogs(dir.to_path_buf()))
}

/// Contents of the log called `name`, with or without the `.log` extension.
pub fn read_log(dir: &Path, name: &str) -> Result<String> {
    let stem = name
        .strip_suffix(&format!(".{LOG_EXTENSION}"))
        .unwrap_or(name);
    let entry = list_logs(dir)?
        .into_iter()
        .find(|e| e.name == stem)
        .ok_or_else(|| DiagError::LogNotFound(name.to_string()))?;
    Ok(fs::read_to_string(entry.path)?)
}

/// Delete every panic log in `dir`, returning how many were removed.
pub fn clear_logs(dir: &Path) -> Result<usize> {
    let logs = list_logs(dir)?;
    for log in &logs {
        fs::remove_file(&log.path)?;
    }
    tracing::debug!(removed = logs.len(), dir = %dir.display(), "logs cleared");
    Ok(logs.len())
}
