//! Script source parser
//!
//! This module transforms script source text into a syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens, including INDENT/DEDENT)
//! - [`parse`]: Parser state and entry point (tokens → AST)
//! - [`ast`]: AST node definitions and generic traversal
//! - [`symbols`]: Per-function scope analysis
//!
//! # Supported Language Subset
//!
//! An indentation-structured scripting language:
//! - Definitions: `def`, `async def`, `class`, decorators
//! - Statements: assignments (plain, augmented, annotated), `if`/`elif`/`else`,
//!   `while`, `for`, `try`/`except`/`else`/`finally`, `with`, `return`, `raise`,
//!   `assert`, `del`, `import`, `global`, `nonlocal`
//! - Expressions: arithmetic, boolean, chained comparisons, conditional
//!   expressions, calls, subscripts, attributes, lists, tuples
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;
pub mod symbols;

mod expressions;
mod statements;

pub use parse::{ParseError, Parser};

/// Parse a complete source file into a [`ast::Module`]
pub fn parse_module(source: &str) -> Result<ast::Module, ParseError> {
    Parser::new(source)?.parse_module()
}
