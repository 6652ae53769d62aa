// Parse-time registry of named definitions and their source spans

use crate::parser::ast::{Module, Node, Stmt};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Inclusive range of source lines occupied by a definition (decorators included)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Maps every `def` / `class` name in a module to the spans defining it.
///
/// Names defined more than once (at any nesting depth) are ambiguous and never
/// resolve.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    spans: FxHashMap<Rc<str>, Vec<SourceSpan>>,
}

impl FunctionRegistry {
    pub fn from_module(module: &Module) -> Self {
        let mut registry = FunctionRegistry::default();
        registry.collect(Node::Module(module));
        registry
    }

    fn collect(&mut self, node: Node<'_>) {
        if let Node::Stmt(stmt) = node {
            let entry = match stmt {
                Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => Some((
                    def.name.clone(),
                    span_with_decorators(def.location.line, def.end_line, &def.decorators),
                )),
                Stmt::ClassDef(def) => Some((
                    def.name.clone(),
                    span_with_decorators(def.location.line, def.end_line, &def.decorators),
                )),
                _ => None,
            };
            if let Some((name, span)) = entry {
                self.spans.entry(name).or_default().push(span);
            }
        }

        for child in node.children() {
            self.collect(child);
        }
    }

    /// The span of `name` if it is defined exactly once
    pub fn resolve(&self, name: &str) -> Option<SourceSpan> {
        match self.spans.get(name).map(Vec::as_slice) {
            Some([span]) => Some(*span),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.spans.get(name).is_some_and(|spans| spans.len() > 1)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

fn span_with_decorators(
    def_line: usize,
    end_line: usize,
    decorators: &[crate::parser::ast::Expr],
) -> SourceSpan {
    let start = decorators
        .iter()
        .map(|d| d.location().line)
        .min()
        .unwrap_or(def_line)
        .min(def_line);
    SourceSpan {
        start,
        end: end_line.max(def_line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn test_resolves_unique_definitions() {
        let source = "x = 1\n\n@wrap\ndef f(a):\n    return a\n\nclass C:\n    def m():\n        pass\n";
        let registry = FunctionRegistry::from_module(&parse_module(source).unwrap());

        assert_eq!(registry.resolve("f"), Some(SourceSpan { start: 3, end: 5 }));
        assert_eq!(registry.resolve("C"), Some(SourceSpan { start: 7, end: 9 }));
        assert_eq!(registry.resolve("m"), Some(SourceSpan { start: 8, end: 9 }));
        assert_eq!(registry.resolve("<module>"), None);
        assert_eq!(registry.resolve("x"), None);
    }

    #[test]
    fn test_redefined_names_are_ambiguous() {
        let source = "def f():\n    pass\ndef g():\n    def f():\n        pass\n";
        let registry = FunctionRegistry::from_module(&parse_module(source).unwrap());

        assert!(registry.is_ambiguous("f"));
        assert_eq!(registry.resolve("f"), None);
        assert_eq!(registry.resolve("g"), Some(SourceSpan { start: 3, end: 5 }));
        assert_eq!(registry.len(), 2);
    }
}
