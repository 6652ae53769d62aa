//! Runtime error types for the script interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to parse errors or I/O errors).
//!
//! Errors fall into two groups:
//! - [`RuntimeError::Exception`]: an exception raised by the script or by a
//!   language operation. These can be caught with `try`/`except`.
//! - Host errors ([`RuntimeError::Sink`], [`RuntimeError::DeadlineExceeded`],
//!   [`RuntimeError::Unsupported`], [`RuntimeError::NoSuchFunction`],
//!   [`RuntimeError::NoFrame`]): raised by the interpreter itself. They always
//!   abort the run.

use crate::memory::value::ExceptionValue;
use crate::parser::ast::SourceLocation;
use crate::trace::SinkError;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A script-level exception such as `ZeroDivisionError`
    #[error("{kind}: {message} (line {})", location.line)]
    Exception {
        kind: String,
        message: String,
        location: SourceLocation,
    },

    /// A trace sink failed while handling an event
    #[error("Trace sink failed at line {}: {source}", location.line)]
    Sink {
        #[source]
        source: SinkError,
        location: SourceLocation,
    },

    /// The configured execution deadline passed
    #[error("Execution deadline of {limit:?} exceeded at line {}", location.line)]
    DeadlineExceeded {
        limit: Duration,
        location: SourceLocation,
    },

    /// Unsupported operation or feature
    #[error("Unsupported operation: {message} at line {}", location.line)]
    Unsupported {
        message: String,
        location: SourceLocation,
    },

    /// Host requested a call to a global that is not a function
    #[error("No function named '{name}'")]
    NoSuchFunction { name: String },

    /// Code was executed with an empty call stack
    #[error("No stack frame available at line {}", location.line)]
    NoFrame { location: SourceLocation },
}

impl RuntimeError {
    /// Build a script-level exception
    pub fn exception(
        kind: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        RuntimeError::Exception {
            kind: kind.into(),
            message: message.into(),
            location,
        }
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::exception("TypeError", message, location)
    }

    pub fn value_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::exception("ValueError", message, location)
    }

    /// Exception class name, for script-level exceptions only
    pub fn exception_kind(&self) -> Option<&str> {
        match self {
            RuntimeError::Exception { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Whether `try`/`except` may handle this error
    pub fn is_catchable(&self) -> bool {
        matches!(self, RuntimeError::Exception { .. })
    }

    /// The exception instance bound by `except ... as name`
    pub fn to_exception_value(&self) -> Option<ExceptionValue> {
        match self {
            RuntimeError::Exception { kind, message, .. } => Some(ExceptionValue {
                kind: Rc::from(kind.as_str()),
                message: message.clone(),
            }),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            RuntimeError::Exception { location, .. }
            | RuntimeError::Sink { location, .. }
            | RuntimeError::DeadlineExceeded { location, .. }
            | RuntimeError::Unsupported { location, .. }
            | RuntimeError::NoFrame { location } => Some(location),
            RuntimeError::NoSuchFunction { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let err = RuntimeError::exception(
            "ZeroDivisionError",
            "division by zero",
            SourceLocation::new(4, 9),
        );
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero (line 4)");
        assert_eq!(err.exception_kind(), Some("ZeroDivisionError"));
        assert!(err.is_catchable());
        assert_eq!(err.location().map(|l| l.line), Some(4));
    }

    #[test]
    fn test_host_errors_are_not_catchable() {
        let err = RuntimeError::Sink {
            source: SinkError::new("boom"),
            location: SourceLocation::new(2, 1),
        };
        assert!(!err.is_catchable());
        assert!(err.exception_kind().is_none());
        assert!(err.to_exception_value().is_none());
        assert!(err.to_string().contains("boom"));
    }
}
