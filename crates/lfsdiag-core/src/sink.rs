//! Write-through sinks that mirror output into the [`Transcript`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::transcript::Transcript;

/// A real output destination shared between the dual sink and the panic log
/// fallback path.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Stream {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

/// Fans every write out to a real stream and to the shared transcript.
///
/// The write fails only if the real stream fails; in that case nothing is
/// captured, so the transcript never holds bytes the user did not see.
#[derive(Debug, Clone)]
pub struct DualSink {
    real: Stream,
    transcript: Transcript,
}

impl DualSink {
    pub fn new(real: Stream, transcript: Transcript) -> Self {
        Self { real, transcript }
    }

    /// The wrapped real stream, bypassing the transcript.
    pub fn real(&self) -> &Stream {
        &self.real
    }
}

impl Write for DualSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut captured = self.transcript.lock();
        self.real.write_all(buf)?;
        captured.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.real.flush()
    }
}
