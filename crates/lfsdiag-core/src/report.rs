//! How the reporting layer sees errors.
//!
//! [`Reportable`] is the seam between domain errors and the dispatch surface:
//! it answers "is this fatal", "what did it wrap", and "does it carry extra
//! diagnostics". [`DiagnosticContext`] is the optional capability behind the
//! last question.
//!
//! [`WrappedError`] is the concrete error type domain code uses when it wants
//! to be fatal or attach context. Everything else (`anyhow::Error`,
//! `std::io::Error`) takes the default branch unless a `WrappedError` sits
//! somewhere in its chain.

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// Structured detail an error can expose to the panic log.
pub trait DiagnosticContext {
    /// Key/value pairs written as `key=value` lines.
    fn context(&self) -> BTreeMap<String, String>;

    /// Description of the wrapped inner error, or an empty string.
    fn inner_description(&self) -> String;

    /// Raw stack trace bytes.
    fn stack(&self) -> Vec<u8>;
}

/// An error the dispatch surface knows how to classify and archive.
pub trait Reportable: fmt::Display {
    /// Whether the error is unrecoverable and always warrants a panic log.
    fn is_fatal(&self) -> bool {
        false
    }

    /// The underlying error this one wraps, if distinct from its own message.
    fn inner_cause(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }

    /// The diagnostic capability, when the error carries one.
    fn diagnostics(&self) -> Option<&dyn DiagnosticContext> {
        None
    }

    /// The line written under the message in a panic log when diagnostics
    /// are present.
    fn inner_summary(&self) -> String {
        self.diagnostics()
            .map(|d| d.inner_description())
            .unwrap_or_default()
    }
}

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error with an optional cause, a fatal flag, context pairs, and the stack at
/// the point it was constructed.
pub struct WrappedError {
    message: String,
    cause: Option<BoxError>,
    fatal: bool,
    context: BTreeMap<String, String>,
    stack: Backtrace,
}

impl WrappedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            fatal: false,
            context: BTreeMap::new(),
            stack: Backtrace::force_capture(),
        }
    }

    /// Wrap `cause` under a new message.
    pub fn wrap(cause: impl Into<BoxError>, message: impl Into<String>) -> Self {
        let mut err = Self::new(message);
        err.cause = Some(cause.into());
        err
    }

    /// Mark the error as fatal.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedError")
            .field("message", &self.message)
            .field("cause", &self.cause)
            .field("fatal", &self.fatal)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl StdError for WrappedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl DiagnosticContext for WrappedError {
    fn context(&self) -> BTreeMap<String, String> {
        self.context.clone()
    }

    fn inner_description(&self) -> String {
        self.cause
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    fn stack(&self) -> Vec<u8> {
        self.stack.to_string().into_bytes()
    }
}

impl Reportable for WrappedError {
    fn is_fatal(&self) -> bool {
        self.fatal
    }

    fn inner_cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.source()
    }

    fn diagnostics(&self) -> Option<&dyn DiagnosticContext> {
        Some(self)
    }
}

impl Reportable for anyhow::Error {
    fn is_fatal(&self) -> bool {
        self.chain()
            .filter_map(|e| e.downcast_ref::<WrappedError>())
            .any(|w| w.fatal)
    }

    // `downcast_ref` looks through context layers, so only the head of the
    // chain decides whether the error itself is a `WrappedError`.
    fn inner_cause(&self) -> Option<&(dyn StdError + 'static)> {
        match self.chain().next().and_then(|e| e.downcast_ref::<WrappedError>()) {
            Some(wrapped) => wrapped.inner_cause(),
            None => self.source(),
        }
    }

    fn diagnostics(&self) -> Option<&dyn DiagnosticContext> {
        self.chain()
            .find_map(|e| e.downcast_ref::<WrappedError>())
            .map(|w| w as &dyn DiagnosticContext)
    }

    fn inner_summary(&self) -> String {
        let found = self
            .chain()
            .enumerate()
            .find_map(|(depth, e)| e.downcast_ref::<WrappedError>().map(|w| (depth, w)));
        match found {
            None => String::new(),
            Some((0, wrapped)) => wrapped.inner_description(),
            Some((_, wrapped)) => match wrapped.inner_description() {
                own if own.is_empty() => wrapped.to_string(),
                own => format!("{wrapped}: {own}"),
            },
        }
    }
}

impl Reportable for std::io::Error {
    fn inner_cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.source()
    }
}
