// Scope analysis for function bodies
//
// Run once per function when the parser finishes its body. The result decides
// where the interpreter looks a name up: the frame's own namespace, an
// enclosing function's namespace, or the module globals.

use crate::parser::ast::*;
use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Classify the names a function binds.
///
/// Nested `def` and `class` bodies are separate scopes: only the name they
/// define is bound here.
pub fn analyze_function(params: &[Param], body: &[Stmt]) -> ScopeInfo {
    let mut scope = ScopeInfo::default();
    let mut assigned = FxHashSet::default();

    for param in params {
        assigned.insert(param.name.clone());
    }
    collect_block(body, &mut assigned, &mut scope);

    scope.locals = assigned
        .into_iter()
        .filter(|name| !scope.globals.contains(name) && !scope.nonlocals.contains(name))
        .collect();
    scope
}

fn collect_block(body: &[Stmt], assigned: &mut FxHashSet<Rc<str>>, scope: &mut ScopeInfo) {
    for stmt in body {
        collect_stmt(stmt, assigned, scope);
    }
}

fn collect_stmt(stmt: &Stmt, assigned: &mut FxHashSet<Rc<str>>, scope: &mut ScopeInfo) {
    match stmt {
        Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => {
            assigned.insert(def.name.clone());
        }
        Stmt::ClassDef(def) => {
            assigned.insert(def.name.clone());
        }
        Stmt::Assign { targets, .. } => {
            for target in targets {
                collect_target(target, assigned);
            }
        }
        Stmt::AugAssign { target, .. } | Stmt::AnnAssign { target, .. } => {
            collect_target(target, assigned);
        }
        Stmt::Delete { targets, .. } => {
            for target in targets {
                collect_target(target, assigned);
            }
        }
        Stmt::For {
            target,
            body,
            orelse,
            ..
        } => {
            collect_target(target, assigned);
            collect_block(body, assigned, scope);
            collect_block(orelse, assigned, scope);
        }
        Stmt::While { body, orelse, .. } | Stmt::If { body, orelse, .. } => {
            collect_block(body, assigned, scope);
            collect_block(orelse, assigned, scope);
        }
        Stmt::With { items, body, .. } => {
            for item in items {
                if let Some(alias) = &item.alias {
                    collect_target(alias, assigned);
                }
            }
            collect_block(body, assigned, scope);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        } => {
            collect_block(body, assigned, scope);
            for handler in handlers {
                if let Some(name) = &handler.name {
                    assigned.insert(name.clone());
                }
                collect_block(&handler.body, assigned, scope);
            }
            collect_block(orelse, assigned, scope);
            collect_block(finalbody, assigned, scope);
        }
        Stmt::Import { names, .. } => {
            for alias in names {
                // `import a.b` binds `a`
                let bound = match &alias.asname {
                    Some(asname) => asname.clone(),
                    None => Rc::from(alias.name.split('.').next().unwrap_or(&alias.name)),
                };
                assigned.insert(bound);
            }
        }
        Stmt::ImportFrom { names, .. } => {
            for alias in names {
                if &*alias.name != "*" {
                    assigned.insert(alias.asname.clone().unwrap_or_else(|| alias.name.clone()));
                }
            }
        }
        Stmt::Global { names, .. } => scope.globals.extend(names.iter().cloned()),
        Stmt::Nonlocal { names, .. } => scope.nonlocals.extend(names.iter().cloned()),
        Stmt::Return { .. }
        | Stmt::Raise { .. }
        | Stmt::Assert { .. }
        | Stmt::Expr { .. }
        | Stmt::Pass { .. }
        | Stmt::Break { .. }
        | Stmt::Continue { .. } => {}
    }
}

/// Names bound by an assignment target; attribute and subscript targets bind nothing
fn collect_target(target: &Expr, assigned: &mut FxHashSet<Rc<str>>) {
    match target {
        Expr::Name { id, .. } => {
            assigned.insert(id.clone());
        }
        Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
            for elt in elts {
                collect_target(elt, assigned);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse_module;

    fn scope_of(source: &str) -> ScopeInfo {
        let module = parse_module(source).unwrap();
        match &module.body[0] {
            Stmt::FunctionDef(def) => def.scope.clone(),
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_locals_include_params_and_assignments() {
        let scope = scope_of("def f(n):\n    i = 1\n    for a, b in n:\n        pass\n    return g(i)\n");
        for name in ["n", "i", "a", "b"] {
            assert!(scope.locals.contains(name), "{name} should be local");
        }
        assert!(!scope.locals.contains("g"));
    }

    #[test]
    fn test_global_and_nonlocal_are_not_local() {
        let scope = scope_of("def f():\n    global x\n    nonlocal y\n    x = 1\n    y = 2\n");
        assert!(scope.locals.is_empty());
        assert!(scope.globals.contains("x"));
        assert!(scope.nonlocals.contains("y"));
    }

    #[test]
    fn test_nested_definitions_bind_only_their_name() {
        let scope = scope_of("def f():\n    def g():\n        z = 1\n    class C:\n        w = 2\n");
        assert!(scope.locals.contains("g"));
        assert!(scope.locals.contains("C"));
        assert!(!scope.locals.contains("z"));
        assert!(!scope.locals.contains("w"));
    }

    #[test]
    fn test_except_alias_and_imports() {
        let scope = scope_of(
            "def f():\n    try:\n        import os.path\n    except ValueError as e:\n        from m import a as b\n",
        );
        assert!(scope.locals.contains("os"));
        assert!(scope.locals.contains("e"));
        assert!(scope.locals.contains("b"));
    }
}
