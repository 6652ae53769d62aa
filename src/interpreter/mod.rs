//! Script interpreter execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: Main interpreter with frame management and the trace sink slot
//! - [`errors`]: Runtime error types
//! - [`output`]: Captured `print` output
//!
//! # Execution Model
//!
//! The interpreter walks the AST and executes statements one at a time.
//! Before each statement the current frame moves to the statement's line and a
//! line event is delivered to the installed trace sink, if any.
//!
//! # Built-in Functions
//!
//! Built-in functions (`print`, `range`, `len`, ...) and list methods are
//! implemented directly on the engine rather than as script code.

pub mod engine;
pub mod errors;
pub mod output;

mod builtins;
mod expressions;
mod jumps;
mod loops;
mod ops;
mod statements;

pub use engine::{ExecConfig, Interpreter, DEFAULT_MAX_DEPTH, MODULE_NAME};
pub use errors::RuntimeError;
