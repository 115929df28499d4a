//! Process-wide capture of everything written to the output streams.

use std::sync::{Arc, Mutex, MutexGuard};

/// Append-only byte buffer shared by both dual sinks.
///
/// Clones share the same underlying buffer. The buffer is never cleared; it is
/// read when a panic log is composed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the end of the transcript.
    pub fn append(&self, bytes: &[u8]) {
        self.lock().extend_from_slice(bytes);
    }

    /// Copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lock the buffer. Sinks hold this guard across the real-stream write so
    /// the capture order matches what reached the terminal.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
