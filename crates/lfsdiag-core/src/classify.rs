//! Severity decision for reported errors.
//!
//! The decision is pure: [`classify`] never writes or exits. The dispatch
//! surface applies the resulting [`Outcome`].

use crate::report::Reportable;

/// Exit status used by every terminating dispatch path.
pub const EXIT_CODE: i32 = 2;

/// What the dispatch surface does with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Write a panic log, then terminate.
    Fatal,
    /// Print the inner cause (if any) and the message, then terminate without a log.
    Recoverable { inner: Option<String> },
}

impl Outcome {
    /// Exit status to apply; both paths terminate.
    pub fn exit_code(&self) -> i32 {
        EXIT_CODE
    }

    pub fn writes_log(&self) -> bool {
        matches!(self, Outcome::Fatal)
    }
}

/// Decide between the panic path and the recoverable path.
///
/// Debugging escalates every error to the panic path.
pub fn classify(err: &dyn Reportable, debugging: bool) -> Outcome {
    if debugging || err.is_fatal() {
        return Outcome::Fatal;
    }
    Outcome::Recoverable {
        inner: err.inner_cause().map(ToString::to_string),
    }
}
