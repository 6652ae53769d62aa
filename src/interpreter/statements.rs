//! Statement execution
//!
//! Adds `impl Interpreter` methods that execute one statement at a time. Every
//! statement except `global` and `nonlocal` first moves the frame to its line
//! and fires the line event, so trace sinks observe statements in execution
//! order.
//!
//! Loops live in [`loops`](super::loops); `return`, `raise` and `try` live in
//! [`jumps`](super::jumps).

use crate::interpreter::engine::{with_stack, ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::{binary_op, check_len};
use crate::memory::stack::{FrameKind, Scope, StackFrame};
use crate::memory::value::{Class, Function, Value};
use crate::parser::ast::*;
use std::rc::Rc;

/// A function body without its leading docstring.
///
/// Function docstrings are never executed and fire no events. Class bodies
/// run theirs like any other statement.
pub(crate) fn body_without_docstring(body: &[Stmt]) -> &[Stmt] {
    match body.first() {
        Some(first) if first.as_docstring().is_some() => &body[1..],
        _ => body,
    }
}

impl Interpreter {
    /// Execute statements until one of them transfers control
    pub(crate) fn execute_block(&mut self, body: &[Stmt]) -> Result<(), RuntimeError> {
        with_stack(|| {
            for stmt in body {
                self.execute_statement(stmt)?;
                if self.control_flow != ControlFlow::Normal {
                    break;
                }
            }
            Ok(())
        })
    }

    /// Execute a single statement
    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        let location = *stmt.location();
        self.current_location = location;

        let result = self
            .fire_statement_lines(stmt, location)
            .and_then(|()| self.dispatch_statement(stmt, location));
        if let Err(err) = &result {
            self.report_exception(err)?;
        }
        result
    }

    /// Line events for `stmt`: each decorator line, then the statement line.
    /// `global` and `nonlocal` are declarations and fire nothing.
    fn fire_statement_lines(
        &mut self,
        stmt: &Stmt,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let decorators: &[Expr] = match stmt {
            Stmt::Global { .. } | Stmt::Nonlocal { .. } => return Ok(()),
            Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => def.decorators.as_slice(),
            Stmt::ClassDef(def) => def.decorators.as_slice(),
            _ => &[],
        };
        for decorator in decorators {
            self.mark_line(decorator.location().line)?;
        }
        self.mark_line(location.line)
    }

    fn dispatch_statement(
        &mut self,
        stmt: &Stmt,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => {
                self.execute_function_def(def, location)
            }

            Stmt::ClassDef(def) => self.execute_class_def(def, location),

            Stmt::Return { value, .. } => self.execute_return(value.as_ref()),

            Stmt::Delete { targets, .. } => {
                for target in targets {
                    self.delete_target(target)?;
                }
                Ok(())
            }

            Stmt::Assign { targets, value, .. } => {
                let value = self.evaluate_expr(value)?;
                for target in targets {
                    self.assign_target(target, value.clone())?;
                }
                Ok(())
            }

            Stmt::AugAssign {
                target, op, value, ..
            } => self.execute_aug_assign(target, *op, value, location),

            Stmt::AnnAssign { target, value, .. } => match value {
                Some(value) => {
                    let value = self.evaluate_expr(value)?;
                    self.assign_target(target, value)
                }
                // A bare annotation binds nothing
                None => Ok(()),
            },

            Stmt::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => self.execute_for(target, iter, body, orelse, location),

            Stmt::While {
                test, body, orelse, ..
            } => self.execute_while(test, body, orelse, location),

            Stmt::If {
                test, body, orelse, ..
            } => {
                if self.evaluate_expr(test)?.is_truthy() {
                    self.execute_block(body)
                } else {
                    self.execute_block(orelse)
                }
            }

            Stmt::With { items, .. } => {
                // No value implements the context manager protocol
                let context = match items.first() {
                    Some(item) => self.evaluate_expr(&item.context)?,
                    None => Value::None,
                };
                Err(RuntimeError::type_error(
                    format!(
                        "'{}' object does not support the context manager protocol",
                        context.type_name()
                    ),
                    location,
                ))
            }

            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => self.execute_try(body, handlers, orelse, finalbody),

            Stmt::Raise { exc, .. } => self.execute_raise(exc.as_ref(), location),

            Stmt::Assert { test, msg, .. } => {
                if self.evaluate_expr(test)?.is_truthy() {
                    return Ok(());
                }
                let message = match msg {
                    Some(msg) => self.evaluate_expr(msg)?.to_string(),
                    None => String::new(),
                };
                Err(RuntimeError::exception("AssertionError", message, location))
            }

            Stmt::Import { names, .. } => {
                let module = names.first().map(|alias| alias.name.as_ref()).unwrap_or("");
                Err(RuntimeError::exception(
                    "ModuleNotFoundError",
                    format!("No module named '{}'", module),
                    location,
                ))
            }

            Stmt::ImportFrom { module, .. } => {
                if module.starts_with('.') {
                    Err(RuntimeError::exception(
                        "ImportError",
                        "attempted relative import with no known parent package",
                        location,
                    ))
                } else {
                    Err(RuntimeError::exception(
                        "ModuleNotFoundError",
                        format!("No module named '{}'", module),
                        location,
                    ))
                }
            }

            // Resolved at parse time
            Stmt::Global { .. } | Stmt::Nonlocal { .. } => Ok(()),

            Stmt::Expr { value, .. } => {
                self.evaluate_expr(value)?;
                Ok(())
            }

            Stmt::Pass { .. } => Ok(()),

            Stmt::Break { .. } => {
                self.control_flow = ControlFlow::Break;
                Ok(())
            }

            Stmt::Continue { .. } => {
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }
        }
    }

    fn execute_function_def(
        &mut self,
        def: &Rc<FunctionDef>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let decorators = self.evaluate_all(&def.decorators)?;

        let mut defaults = Vec::new();
        for param in &def.params {
            if let Some(default) = &param.default {
                defaults.push(self.evaluate_expr(default)?);
            }
        }

        let closure = self.current_frame()?.closure_scope();
        let function = Value::Function(Rc::new(Function {
            def: Rc::clone(def),
            defaults,
            closure,
        }));

        let value = self.apply_decorators(decorators, function, location)?;
        self.store_name(&def.name, value)
    }

    fn execute_class_def(
        &mut self,
        def: &Rc<ClassDef>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let decorators = self.evaluate_all(&def.decorators)?;
        let bases = self.evaluate_all(&def.bases)?;
        let is_exception = bases.iter().any(|base| match base {
            Value::ExceptionType(_) => true,
            Value::Class(class) => class.is_exception,
            _ => false,
        });

        let namespace = Scope::new(self.current_frame()?.closure_scope());
        let frame = StackFrame::new(
            def.name.clone(),
            def.code,
            def.location.line,
            FrameKind::Class {
                namespace: namespace.clone(),
            },
        );
        self.run_frame(frame, &def.body)?;
        self.current_location = location;

        let class = Value::Class(Rc::new(Class {
            name: def.name.clone(),
            namespace,
            is_exception,
        }));
        let value = self.apply_decorators(decorators, class, location)?;
        self.store_name(&def.name, value)
    }

    /// Decorators apply bottom-up
    fn apply_decorators(
        &mut self,
        decorators: Vec<Value>,
        mut value: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        for decorator in decorators.into_iter().rev() {
            value = self.call_value(decorator, vec![value], location)?;
        }
        Ok(value)
    }

    /// Bind `value` to an assignment target, unpacking tuples and lists
    pub(crate) fn assign_target(
        &mut self,
        target: &Expr,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match target {
            Expr::Name { id, .. } => self.store_name(id, value),

            Expr::Tuple { elts, location } | Expr::List { elts, location } => {
                // One extra item is enough to report a length mismatch
                let items: Vec<Value> = self
                    .iterate(&value, *location)?
                    .take(elts.len() + 1)
                    .collect();
                if items.len() < elts.len() {
                    return Err(RuntimeError::value_error(
                        format!(
                            "not enough values to unpack (expected {}, got {})",
                            elts.len(),
                            items.len()
                        ),
                        *location,
                    ));
                }
                if items.len() > elts.len() {
                    return Err(RuntimeError::value_error(
                        format!("too many values to unpack (expected {})", elts.len()),
                        *location,
                    ));
                }
                for (elt, item) in elts.iter().zip(items) {
                    self.assign_target(elt, item)?;
                }
                Ok(())
            }

            Expr::Subscript {
                value: object,
                index,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                let index = self.evaluate_expr(index)?;
                self.set_item(&object, &index, value, *location)
            }

            Expr::Attribute {
                value: object,
                attr,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                self.set_attribute(&object, attr, value, *location)
            }

            other => Err(RuntimeError::Unsupported {
                message: "cannot assign to expression".to_string(),
                location: *other.location(),
            }),
        }
    }

    fn delete_target(&mut self, target: &Expr) -> Result<(), RuntimeError> {
        match target {
            Expr::Name { id, .. } => self.delete_name(id),

            Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
                for elt in elts {
                    self.delete_target(elt)?;
                }
                Ok(())
            }

            Expr::Subscript {
                value: object,
                index,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                let index = self.evaluate_expr(index)?;
                match &object {
                    Value::List(items) => {
                        let position =
                            self.resolve_index(&index, items.borrow().len(), "list", *location)?;
                        items.borrow_mut().remove(position);
                        Ok(())
                    }
                    other => Err(RuntimeError::type_error(
                        format!("'{}' object doesn't support item deletion", other.type_name()),
                        *location,
                    )),
                }
            }

            Expr::Attribute {
                value: object,
                attr,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                match &object {
                    Value::Class(class) if class.namespace.remove(attr).is_some() => Ok(()),
                    other => Err(RuntimeError::exception(
                        "AttributeError",
                        format!("'{}' object has no attribute '{}'", other.type_name(), attr),
                        *location,
                    )),
                }
            }

            other => Err(RuntimeError::Unsupported {
                message: "cannot delete expression".to_string(),
                location: *other.location(),
            }),
        }
    }

    fn execute_aug_assign(
        &mut self,
        target: &Expr,
        op: BinOp,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match target {
            Expr::Name { id, location } => {
                let current = self.lookup_name(id, *location)?;
                let operand = self.evaluate_expr(value)?;
                let result = self.augmented(op, current, &operand, *location)?;
                self.store_name(id, result)
            }

            Expr::Subscript {
                value: object,
                index,
                location,
            } => {
                // Container and index are evaluated once
                let object = self.evaluate_expr(object)?;
                let index = self.evaluate_expr(index)?;
                let current = self.subscript(&object, &index, *location)?;
                let operand = self.evaluate_expr(value)?;
                let result = self.augmented(op, current, &operand, *location)?;
                self.set_item(&object, &index, result, *location)
            }

            Expr::Attribute {
                value: object,
                attr,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                let current = self.get_attribute(&object, attr, *location)?;
                let operand = self.evaluate_expr(value)?;
                let result = self.augmented(op, current, &operand, *location)?;
                self.set_attribute(&object, attr, result, *location)
            }

            _ => Err(RuntimeError::Unsupported {
                message: "illegal target for augmented assignment".to_string(),
                location,
            }),
        }
    }

    /// `current op= operand`; lists are extended in place
    fn augmented(
        &mut self,
        op: BinOp,
        current: Value,
        operand: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let (BinOp::Add, Value::List(items)) = (op, &current) {
            let extra = self.collect_items(operand, location)?;
            check_len(items.borrow().len().saturating_add(extra.len()), location)?;
            items.borrow_mut().extend(extra);
            return Ok(current);
        }
        binary_op(op, &current, operand, location)
    }

    fn set_item(
        &mut self,
        object: &Value,
        index: &Value,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match object {
            Value::List(items) => {
                let position = self.resolve_index(index, items.borrow().len(), "list", location)?;
                items.borrow_mut()[position] = value;
                Ok(())
            }
            other => Err(RuntimeError::type_error(
                format!(
                    "'{}' object does not support item assignment",
                    other.type_name()
                ),
                location,
            )),
        }
    }

    fn set_attribute(
        &mut self,
        object: &Value,
        attr: &Rc<str>,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match object {
            Value::Class(class) => {
                class.namespace.set(attr.clone(), value);
                Ok(())
            }
            other => Err(RuntimeError::exception(
                "AttributeError",
                format!(
                    "'{}' object attribute '{}' is read-only",
                    other.type_name(),
                    attr
                ),
                location,
            )),
        }
    }
}
