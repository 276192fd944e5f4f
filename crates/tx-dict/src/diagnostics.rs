// Human-readable result and error logs kept by builders and readers

use std::fmt::{Display, Write};

/// Operation log of the last build or open.
///
/// The logs are informational only: success and failure are reported through
/// return values. Both logs are cleared when a new operation starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    result: String,
    error: String,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything logged so far.
    pub fn clear(&mut self) {
        self.result.clear();
        self.error.clear();
    }

    /// Append a line to the result log.
    pub fn note(&mut self, message: impl Display) {
        let _ = writeln!(self.result, "{message}");
    }

    /// Append a line to the error log.
    pub fn error(&mut self, message: impl Display) {
        let _ = writeln!(self.error, "{message}");
    }

    /// Log of completed steps.
    pub fn result_log(&self) -> &str {
        &self.result
    }

    /// Log of failures; empty when the last operation succeeded.
    pub fn error_log(&self) -> &str {
        &self.error
    }
}
