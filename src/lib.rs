//! # Introduction
//!
//! linecov measures statement coverage of small scripts written in a
//! Python-syntax language. It runs a script under a line tracer, records every
//! `(function, line)` pair that executed, and divides the number of distinct
//! pairs by the number of statements found in the script's syntax tree.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST ─┬─ Statement counter ──────────────┐
//!                                └─ Interpreter → Tracer → Coverage ┴→ Report
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds the AST.
//! 2. [`analysis`]: counts statement nodes and maps definitions to source spans.
//! 3. [`interpreter`]: walks the AST and delivers call, line, return and
//!    exception events to the trace sink installed on it.
//! 4. [`memory`]: runtime values, scopes and the call stack.
//! 5. [`trace`]: the sink interface and the scoped coverage [`trace::Tracer`].
//! 6. [`runner`]: runs a script once per input file and builds reports.
//! 7. [`ui`]: ratatui coverage viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use linecov::interpreter::Interpreter;
//! use linecov::trace::Tracer;
//!
//! let mut interp = Interpreter::from_source("x = 1\nif x:\n    y = 2\n").unwrap();
//! let tracer = Tracer::new();
//! {
//!     let mut scope = tracer.enter(&mut interp).unwrap();
//!     scope.run().unwrap();
//! }
//! assert_eq!(tracer.coverage().len(), 3);
//! assert_eq!(linecov::analysis::count_source("x = 1\nif x:\n    y = 2\n").unwrap(), 3);
//! ```

pub mod analysis;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod runner;
pub mod trace;
pub mod ui;
