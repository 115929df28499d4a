//! Removal of stale temporary objects at shutdown.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Temp files younger than this are left alone; another process may own them.
pub const TEMP_OBJECT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Delete regular files in `dir` last modified more than `max_age` ago.
///
/// A missing directory is not an error. Returns the number of files removed.
pub fn clear_temp_objects(dir: &Path, max_age: Duration) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let age = now
            .duration_since(meta.modified()?)
            .unwrap_or(Duration::ZERO);
        if age >= max_age {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!(removed, dir = %dir.display(), "removed stale temp objects");
    }
    Ok(removed)
}
