//! Static statement analysis
//!
//! This module provides the coverage denominator:
//! - [`count_statements`]: recursive count of statement-kind nodes below a node
//! - [`total_statements`]: read, parse and count a source file
//! - [`registry`]: parse-time map from definition names to source spans, used
//!   by the annotated coverage listing
//!
//! # Statement Kinds
//!
//! A node counts when it is one of: assignment (plain, augmented, annotated),
//! `for`, `while`, `if`, `with`, `try`, an `except` clause, `def`, `async def`,
//! `class`, `return`, `del`, `raise`, `assert`, `import`, `from ... import`,
//! `global`, `nonlocal`, `pass`, `break` or `continue`.
//!
//! Expression statements (including docstrings and bare calls) are not counted,
//! so a run can cover more lines than there are statements.

pub mod registry;

use crate::parser::ast::{Node, Stmt};
use crate::parser::{parse_module, ParseError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use registry::{FunctionRegistry, SourceSpan};

/// Errors from [`total_statements`]. Both are fatal: no partial count is produced.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Whether `node` itself is a statement-kind node
pub fn is_statement(node: Node<'_>) -> bool {
    match node {
        Node::ExceptHandler(_) => true,
        Node::Stmt(stmt) => !matches!(stmt, Stmt::Expr { .. }),
        Node::Module(_) | Node::Expr(_) | Node::Param(_) | Node::WithItem(_) | Node::Alias(_) => {
            false
        }
    }
}

/// Count statement-kind nodes in the subtree rooted at `node`, including `node`.
///
/// Every child is visited regardless of its kind, so statements reachable only
/// through expressions or parameters are still found.
pub fn count_statements(node: Node<'_>) -> usize {
    let own = usize::from(is_statement(node));
    own + node
        .children()
        .into_iter()
        .map(count_statements)
        .sum::<usize>()
}

/// Count the statements of already-loaded source text
pub fn count_source(source: &str) -> Result<usize, ParseError> {
    let module = parse_module(source)?;
    Ok(count_statements(Node::Module(&module)))
}

/// Read and parse the file at `path` and count its statements
pub fn total_statements(path: impl AsRef<Path>) -> Result<usize, AnalysisError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let count = count_source(&source).map_err(|source| AnalysisError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), statements = count, "counted statements");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORIAL: &str = r#"def factorial(n):
    """
    Calculates the factorial of a given number.
    If the number is negative, returns None.
    """
    if n < 0:
        return None
    else:
        i = 1
        F = 1
        while True:
            if not i < n:
                break
            else:
                i = i + 1
                F = i * F
        return F
"#;

    #[test]
    fn test_factorial_hand_count() {
        // def, if, return None, i = 1, F = 1, while, inner if, break,
        // i = i + 1, F = i * F, return F
        assert_eq!(count_source(FACTORIAL).unwrap(), 11);
    }

    #[test]
    fn test_empty_and_expression_only_sources() {
        assert_eq!(count_source("").unwrap(), 0);
        assert_eq!(count_source("# only a comment\n").unwrap(), 0);
        assert_eq!(count_source("'''docstring'''\nprint(1)\n1 + 2\n").unwrap(), 0);
    }

    #[test]
    fn test_every_statement_kind_counts_once() {
        let source = "\
import a
from b import c
x = 1
x += 1
y: int = 2
del x
global g
assert y
for i in r:
    continue
while y:
    break
with m as n:
    pass
try:
    raise E
except E:
    pass
class K:
    pass
async def h():
    nonlocal q
    return
";
        // 22 statements plus one except handler
        assert_eq!(count_source(source).unwrap(), 23);
    }

    #[test]
    fn test_counting_is_per_node_not_per_line() {
        assert_eq!(count_source("a = 1; b = 2; pass\n").unwrap(), 3);
        assert_eq!(count_source("if a: b = 1\n").unwrap(), 2);
    }

    #[test]
    fn test_subtree_count() {
        let module = parse_module("def f():\n    x = 1\n    return x\ny = 2\n").unwrap();
        assert_eq!(count_statements(Node::Stmt(&module.body[0])), 3);
        assert_eq!(count_statements(Node::Stmt(&module.body[1])), 1);
        assert_eq!(count_statements(Node::Module(&module)), 4);
    }

    #[test]
    fn test_total_statements_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.py");
        assert!(matches!(
            total_statements(&missing),
            Err(AnalysisError::Io { .. })
        ));

        let broken = dir.path().join("broken.py");
        fs::write(&broken, "def f(:\n").unwrap();
        assert!(matches!(
            total_statements(&broken),
            Err(AnalysisError::Parse { .. })
        ));

        let good = dir.path().join("good.py");
        fs::write(&good, FACTORIAL).unwrap();
        assert_eq!(total_statements(&good).unwrap(), 11);
    }
}
