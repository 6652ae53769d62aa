//! Execution tracing
//!
//! The interpreter reports execution through a single trace sink slot owned by
//! each [`Interpreter`](crate::interpreter::engine::Interpreter):
//! - [`TraceSink`]: receives a [`TraceEvent`] with the [`FrameInfo`] it happened in
//! - [`tracer`]: the coverage [`Tracer`], a scoped sink that records line hits
//!   and chains to whatever sink was installed before it
//!
//! # Events
//!
//! | Event       | Fired                                                        |
//! |-------------|--------------------------------------------------------------|
//! | `Call`      | a module, function or class body frame starts               |
//! | `Line`      | before each statement, and before a loop header is re-tested |
//! | `Return`    | a frame ends, normally or by an exception                    |
//! | `Exception` | an exception propagates out of a statement in a frame        |
//!
//! A sink that answers a `Call` with [`TraceControl::Detach`] receives no
//! further events for that frame. Frames it calls into still fire `Call`.

pub mod tracer;

use crate::parser::ast::CodeId;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

pub use tracer::{Tracer, TracerError, TracerScope};

/// Kind of execution event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    Call,
    Line,
    Return,
    Exception,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceEvent::Call => "call",
            TraceEvent::Line => "line",
            TraceEvent::Return => "return",
            TraceEvent::Exception => "exception",
        };
        write!(f, "{}", name)
    }
}

/// The frame an event was fired in
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// `<module>`, or the enclosing function or class name
    pub function: Rc<str>,
    /// Identity of the executing code object
    pub code: CodeId,
    pub line: usize,
    /// Call depth, 1 for the outermost frame
    pub depth: usize,
}

/// What the interpreter should do after delivering an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceControl {
    /// Keep tracing this frame
    #[default]
    Continue,
    /// Stop delivering events for this frame (meaningful on `Call` only)
    Detach,
}

/// Error raised by a trace sink; aborts the traced run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        SinkError {
            message: message.into(),
        }
    }
}

/// Receiver of execution events
pub trait TraceSink {
    fn on_event(&mut self, frame: &FrameInfo, event: TraceEvent)
        -> Result<TraceControl, SinkError>;
}

/// One recorded line execution
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineHit {
    pub function: Rc<str>,
    pub line: usize,
}

impl LineHit {
    pub fn new(function: impl Into<Rc<str>>, line: usize) -> Self {
        LineHit {
            function: function.into(),
            line,
        }
    }
}

impl fmt::Display for LineHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {})", self.function, self.line)
    }
}

/// Render a coverage set in the source language's set notation
pub fn format_coverage(coverage: &BTreeSet<LineHit>) -> String {
    if coverage.is_empty() {
        return "set()".to_string();
    }

    let items: Vec<String> = coverage.iter().map(LineHit::to_string).collect();
    format!("{{{}}}", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coverage() {
        assert_eq!(format_coverage(&BTreeSet::new()), "set()");

        let coverage: BTreeSet<LineHit> = [
            LineHit::new("factorial", 9),
            LineHit::new("factorial", 6),
            LineHit::new("<module>", 18),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            format_coverage(&coverage),
            "{('<module>', 18), ('factorial', 6), ('factorial', 9)}"
        );
    }
}
