//! Expression evaluation implementation
//!
//! This module handles evaluation of every expression form, including:
//!
//! - Constants, names, list and tuple displays
//! - Arithmetic, unary and chained comparison operators (see [`ops`](super::ops))
//! - Short-circuiting `and` / `or`, which return the deciding operand
//! - Conditional expressions
//! - Subscripts, attribute access and calls
//!
//! Calling a user function pushes a new frame through
//! [`Interpreter::run_frame`], which fires the call and return events.

use crate::interpreter::engine::{with_stack, Interpreter, DEADLINE_STRIDE};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::{binary_op, check_len};
use crate::interpreter::ops::compare::compare;
use crate::interpreter::ops::unary::unary_op;
use crate::interpreter::statements::body_without_docstring;
use crate::memory::stack::{FrameKind, Scope, StackFrame};
use crate::memory::value::{range_len, ExceptionValue, Function, ListMethod, Value, ValueIter};
use crate::parser::ast::*;
use std::rc::Rc;

impl Interpreter {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        with_stack(|| self.evaluate_node(expr))
    }

    fn evaluate_node(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Constant { value, .. } => Ok(match value {
                Constant::None => Value::None,
                Constant::Bool(b) => Value::Bool(*b),
                Constant::Int(n) => Value::Int(*n),
                Constant::Float(x) => Value::Float(*x),
                Constant::Str(s) => Value::Str(s.clone()),
            }),

            Expr::Name { id, location } => self.lookup_name(id, *location),

            Expr::List { elts, .. } => Ok(Value::list(self.evaluate_all(elts)?)),

            Expr::Tuple { elts, .. } => Ok(Value::tuple(self.evaluate_all(elts)?)),

            Expr::BinOp {
                left,
                op,
                right,
                location,
            } => {
                let left = self.evaluate_expr(left)?;
                let right = self.evaluate_expr(right)?;
                binary_op(*op, &left, &right, *location)
            }

            Expr::UnaryOp {
                op,
                operand,
                location,
            } => {
                let operand = self.evaluate_expr(operand)?;
                unary_op(*op, &operand, *location)
            }

            Expr::BoolOp { op, values, .. } => {
                let mut result = Value::None;
                for value in values {
                    result = self.evaluate_expr(value)?;
                    let decided = match op {
                        BoolOp::And => !result.is_truthy(),
                        BoolOp::Or => result.is_truthy(),
                    };
                    if decided {
                        break;
                    }
                }
                Ok(result)
            }

            Expr::Compare {
                left,
                ops,
                comparators,
                location,
            } => {
                // `a < b < c` evaluates `b` once and stops at the first false link
                let mut left = self.evaluate_expr(left)?;
                for (op, comparator) in ops.iter().zip(comparators) {
                    let right = self.evaluate_expr(comparator)?;
                    if !compare(*op, &left, &right, *location)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }

            Expr::Call {
                func,
                args,
                location,
            } => {
                let callee = self.evaluate_expr(func)?;
                let args = self.evaluate_all(args)?;
                self.call_value(callee, args, *location)
            }

            Expr::Attribute {
                value,
                attr,
                location,
            } => {
                let object = self.evaluate_expr(value)?;
                self.get_attribute(&object, attr, *location)
            }

            Expr::Subscript {
                value,
                index,
                location,
            } => {
                let object = self.evaluate_expr(value)?;
                let index = self.evaluate_expr(index)?;
                self.subscript(&object, &index, *location)
            }

            Expr::IfExp {
                test, body, orelse, ..
            } => {
                if self.evaluate_expr(test)?.is_truthy() {
                    self.evaluate_expr(body)
                } else {
                    self.evaluate_expr(orelse)
                }
            }
        }
    }

    /// Evaluate expressions left to right
    pub(crate) fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.evaluate_expr(expr)).collect()
    }

    /// Iterate `value`, or raise `TypeError` if it is not iterable
    pub(crate) fn iterate(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<ValueIter, RuntimeError> {
        value.iter().ok_or_else(|| {
            RuntimeError::type_error(
                format!("'{}' object is not iterable", value.type_name()),
                location,
            )
        })
    }

    /// Copy every item of `value` into a new vector.
    ///
    /// Ranges longer than the sequence cap raise `MemoryError` up front, and
    /// the deadline is checked while items are copied.
    pub(crate) fn collect_items(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        if let Value::Range { start, stop, step } = value {
            check_len(range_len(*start, *stop, *step), location)?;
        }

        let mut items = Vec::new();
        for item in self.iterate(value, location)? {
            if items.len() % DEADLINE_STRIDE == 0 {
                self.check_deadline()?;
            }
            items.push(item);
        }
        Ok(items)
    }

    // ===== Calls =====

    /// Call any callable value with positional arguments
    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args, location),
            Value::Builtin(builtin) => self.call_builtin(builtin, args, location),
            Value::ListMethod(items, method) => {
                self.call_list_method(&items, method, args, location)
            }
            Value::ExceptionType(kind) => Ok(new_exception(kind, args)),
            Value::Class(class) if class.is_exception => {
                Ok(new_exception(class.name.clone(), args))
            }
            Value::Class(class) => Err(RuntimeError::Unsupported {
                message: format!("creating instances of class '{}'", class.name),
                location,
            }),
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not callable", other.type_name()),
                location,
            )),
        }
    }

    fn call_function(
        &mut self,
        function: Rc<Function>,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let def = Rc::clone(&function.def);
        check_arity(&function, args.len(), location)?;

        let required = function.required_params();
        let locals = Scope::new(function.closure.clone());
        let mut args = args.into_iter();
        for (i, param) in def.params.iter().enumerate() {
            let value = match args.next() {
                Some(value) => value,
                None => function
                    .defaults
                    .get(i - required)
                    .cloned()
                    .unwrap_or_default(),
            };
            locals.set(param.name.clone(), value);
        }

        let frame = StackFrame::new(
            def.name.clone(),
            def.code,
            def.location.line,
            FrameKind::Function {
                def: Rc::clone(&def),
                locals,
            },
        );
        let result = self.run_frame(frame, body_without_docstring(&def.body));
        self.current_location = location;
        result
    }

    // ===== Subscripts and attributes =====

    /// Normalize a possibly negative index into `0..len`
    pub(crate) fn resolve_index(
        &self,
        index: &Value,
        len: usize,
        kind: &str,
        location: SourceLocation,
    ) -> Result<usize, RuntimeError> {
        let Some(raw) = index.as_int() else {
            return Err(RuntimeError::type_error(
                format!(
                    "{} indices must be integers or slices, not {}",
                    kind.trim_end_matches(" object"),
                    index.type_name()
                ),
                location,
            ));
        };

        let len = len as i64;
        let position = if raw < 0 { raw + len } else { raw };
        if (0..len).contains(&position) {
            Ok(position as usize)
        } else {
            Err(RuntimeError::exception(
                "IndexError",
                format!("{} index out of range", kind),
                location,
            ))
        }
    }

    pub(crate) fn subscript(
        &self,
        object: &Value,
        index: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match object {
            Value::List(items) => {
                let items = items.borrow();
                let position = self.resolve_index(index, items.len(), "list", location)?;
                Ok(items[position].clone())
            }
            Value::Tuple(items) => {
                let position = self.resolve_index(index, items.len(), "tuple", location)?;
                Ok(items[position].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let position = self.resolve_index(index, chars.len(), "string", location)?;
                Ok(Value::Str(Rc::from(chars[position].to_string())))
            }
            Value::Range { start, stop, step } => {
                let len = range_len(*start, *stop, *step);
                let position = self.resolve_index(index, len, "range object", location)?;
                Ok(Value::Int(start + step * position as i64))
            }
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not subscriptable", other.type_name()),
                location,
            )),
        }
    }

    pub(crate) fn get_attribute(
        &self,
        object: &Value,
        attr: &Rc<str>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let found = match object {
            Value::Class(class) => {
                return class.namespace.get(attr).ok_or_else(|| {
                    RuntimeError::exception(
                        "AttributeError",
                        format!("type object '{}' has no attribute '{}'", class.name, attr),
                        location,
                    )
                })
            }
            Value::List(items) => ListMethod::from_name(attr)
                .map(|method| Value::ListMethod(Rc::clone(items), method)),
            _ => None,
        };

        found.ok_or_else(|| {
            RuntimeError::exception(
                "AttributeError",
                format!("'{}' object has no attribute '{}'", object.type_name(), attr),
                location,
            )
        })
    }
}

fn check_arity(
    function: &Function,
    given: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let name = &function.def.name;
    let total = function.def.params.len();
    let required = function.required_params();

    if given > total {
        let takes = if required == total {
            format!("{} positional argument{}", total, plural(total))
        } else {
            format!("from {} to {} positional arguments", required, total)
        };
        let verb = if given == 1 { "was" } else { "were" };
        return Err(RuntimeError::type_error(
            format!("{}() takes {} but {} {} given", name, takes, given, verb),
            location,
        ));
    }

    if given < required {
        let missing: Vec<String> = function.def.params[given..required]
            .iter()
            .map(|param| format!("'{}'", param.name))
            .collect();
        return Err(RuntimeError::type_error(
            format!(
                "{}() missing {} required positional argument{}: {}",
                name,
                missing.len(),
                plural(missing.len()),
                join_names(&missing)
            ),
            location,
        ));
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// Instantiate an exception class with the given constructor arguments
fn new_exception(kind: Rc<str>, args: Vec<Value>) -> Value {
    let message = match args.len() {
        0 => String::new(),
        1 => args[0].to_string(),
        _ => Value::tuple(args).to_string(),
    };
    Value::Exception(Rc::new(ExceptionValue { kind, message }))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::Interpreter;
    use crate::memory::value::Value;

    fn eval_global(source: &str, name: &str) -> Value {
        let mut interp = Interpreter::from_source(source).expect("parse failed");
        interp.run().expect("run failed");
        interp.global(name).expect("global not set")
    }

    fn run_error(source: &str) -> String {
        let mut interp = Interpreter::from_source(source).expect("parse failed");
        interp.run().expect_err("expected an error").to_string()
    }

    #[test]
    fn test_bool_ops_return_operand() {
        assert_eq!(eval_global("x = 0 or 'fallback'\n", "x").to_string(), "fallback");
        assert_eq!(eval_global("x = 3 and 4\n", "x").to_string(), "4");
        assert_eq!(eval_global("x = [] and 1\n", "x").to_string(), "[]");
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        // The division would raise if evaluated
        assert_eq!(eval_global("x = False and 1 / 0\n", "x").to_string(), "False");
        assert_eq!(eval_global("x = True or 1 / 0\n", "x").to_string(), "True");
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(eval_global("x = 1 < 2 < 3\n", "x").to_string(), "True");
        assert_eq!(eval_global("x = 1 < 3 < 2\n", "x").to_string(), "False");
    }

    #[test]
    fn test_subscripts() {
        assert_eq!(eval_global("x = [1, 2, 3][-1]\n", "x").to_string(), "3");
        assert_eq!(eval_global("x = 'abc'[1]\n", "x").to_string(), "b");
        assert_eq!(eval_global("x = range(0, 10, 3)[2]\n", "x").to_string(), "6");
        assert_eq!(
            run_error("x = [1][5]\n"),
            "IndexError: list index out of range (line 1)"
        );
        assert_eq!(
            run_error("x = (1, 2)['a']\n"),
            "TypeError: tuple indices must be integers or slices, not str (line 1)"
        );
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(
            run_error("def f(a, b):\n    pass\nf(1)\n"),
            "TypeError: f() missing 1 required positional argument: 'b' (line 3)"
        );
        assert_eq!(
            run_error("def f(a, b, c):\n    pass\nf()\n"),
            "TypeError: f() missing 3 required positional arguments: 'a', 'b', and 'c' (line 3)"
        );
        assert_eq!(
            run_error("def f(a):\n    pass\nf(1, 2)\n"),
            "TypeError: f() takes 1 positional argument but 2 were given (line 3)"
        );
        assert_eq!(
            run_error("def f(a, b=1):\n    pass\nf(1, 2, 3)\n"),
            "TypeError: f() takes from 1 to 2 positional arguments but 3 were given (line 3)"
        );
    }

    #[test]
    fn test_closures_see_enclosing_locals() {
        let source = "def outer():\n    n = 5\n    def inner():\n        return n * 2\n    return inner()\nx = outer()\n";
        assert_eq!(eval_global(source, "x").to_string(), "10");
    }

    #[test]
    fn test_list_methods_share_storage() {
        let source = "a = [1]\nb = a\nb.append(2)\nlast = a.pop()\n";
        assert_eq!(eval_global(source, "a").to_string(), "[1]");
        assert_eq!(eval_global(source, "last").to_string(), "2");
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(
            run_error("x = 1\nx()\n"),
            "TypeError: 'int' object is not callable (line 2)"
        );
    }

    #[test]
    fn test_exception_instances() {
        assert_eq!(eval_global("e = ValueError('bad')\n", "e").repr(), "ValueError('bad')");
        assert_eq!(eval_global("e = KeyError()\n", "e").repr(), "KeyError()");
    }
}
