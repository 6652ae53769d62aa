//! Built-in function implementations
//!
//! This module provides the functions that are directly handled by the
//! interpreter rather than being defined in user code.
//!
//! # Supported Built-ins
//!
//! - `print(*values)`: space-separated output to the captured terminal
//! - `range(stop)`, `range(start, stop[, step])`: lazy integer ranges
//! - `len`, `abs`, `min`, `max`, `sum`
//! - Conversions: `int`, `float`, `str`, `bool`, `list`
//!
//! List objects also expose `append(x)` and `pop([index])`.
//!
//! # Implementation Notes
//!
//! - Keyword arguments are rejected by the parser, so every built-in takes
//!   positional arguments only
//! - `min`/`max` accept either one iterable or two or more values
//! - All built-ins are implemented as methods on the [`Interpreter`] struct

use crate::interpreter::engine::{Interpreter, DEADLINE_STRIDE};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::binary_op;
use crate::interpreter::ops::compare::compare;
use crate::memory::value::{range_len, Builtin, ListMethod, Value, ValueIter};
use crate::parser::ast::{BinOp, CmpOp, SourceLocation};
use std::cell::RefCell;
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match builtin {
            Builtin::Print => self.builtin_print(&args),
            Builtin::Range => builtin_range(&args, location),
            Builtin::Len => {
                let value = single_arg("len", &args, location)?;
                let len = match value {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.borrow().len(),
                    Value::Tuple(items) => items.len(),
                    Value::Range { start, stop, step } => range_len(*start, *stop, *step),
                    other => {
                        return Err(RuntimeError::type_error(
                            format!("object of type '{}' has no len()", other.type_name()),
                            location,
                        ))
                    }
                };
                Ok(Value::Int(len as i64))
            }
            Builtin::Abs => {
                let value = single_arg("abs", &args, location)?;
                match value {
                    Value::Float(x) => Ok(Value::Float(x.abs())),
                    other => match other.as_int() {
                        Some(n) => n.checked_abs().map(Value::Int).ok_or_else(|| {
                            RuntimeError::exception("OverflowError", "integer overflow", location)
                        }),
                        None => Err(RuntimeError::type_error(
                            format!("bad operand type for abs(): '{}'", other.type_name()),
                            location,
                        )),
                    },
                }
            }
            Builtin::Min => self.builtin_extreme("min", CmpOp::Lt, args, location),
            Builtin::Max => self.builtin_extreme("max", CmpOp::Gt, args, location),
            Builtin::Int => match optional_arg("int", &args, location)? {
                None => Ok(Value::Int(0)),
                Some(value) => to_int(value, location),
            },
            Builtin::Float => match optional_arg("float", &args, location)? {
                None => Ok(Value::Float(0.0)),
                Some(value) => to_float(value, location),
            },
            Builtin::Str => Ok(match optional_arg("str", &args, location)? {
                None => Value::str(""),
                Some(value) => Value::Str(value.to_string().into()),
            }),
            Builtin::Bool => Ok(Value::Bool(
                optional_arg("bool", &args, location)?.is_some_and(Value::is_truthy),
            )),
            Builtin::List => match optional_arg("list", &args, location)? {
                None => Ok(Value::list(Vec::new())),
                Some(value) => Ok(Value::list(self.collect_items(value, location)?)),
            },
            Builtin::Sum => {
                let (iterable, start) = match args.as_slice() {
                    [iterable] => (iterable, Value::Int(0)),
                    [iterable, start] => (iterable, start.clone()),
                    _ => {
                        return Err(RuntimeError::type_error(
                            format!("sum() takes at most 2 arguments ({} given)", args.len()),
                            location,
                        ))
                    }
                };
                let mut total = start;
                for (count, item) in self.iterate(iterable, location)?.enumerate() {
                    if count % DEADLINE_STRIDE == 0 {
                        self.check_deadline()?;
                    }
                    total = binary_op(BinOp::Add, &total, &item, location)?;
                }
                Ok(total)
            }
        }
    }

    fn builtin_print(&mut self, args: &[Value]) -> Result<Value, RuntimeError> {
        let text: Vec<String> = args.iter().map(Value::to_string).collect();
        let line = self.current_location.line;
        self.terminal.write(&format!("{}\n", text.join(" ")), line);
        Ok(Value::None)
    }

    /// `min`/`max`: the first item that no other item beats under `op`
    fn builtin_extreme(
        &mut self,
        name: &str,
        op: CmpOp,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut items = match args.len() {
            0 => {
                return Err(RuntimeError::type_error(
                    format!("{} expected at least 1 argument, got 0", name),
                    location,
                ))
            }
            1 => self.iterate(&args[0], location)?,
            _ => ValueIter::Items(args.into_iter()),
        };

        let Some(mut best) = items.next() else {
            return Err(RuntimeError::value_error(
                format!("{}() arg is an empty sequence", name),
                location,
            ));
        };
        for (count, item) in items.enumerate() {
            if count % DEADLINE_STRIDE == 0 {
                self.check_deadline()?;
            }
            if compare(op, &item, &best, location)? {
                best = item;
            }
        }
        Ok(best)
    }

    pub(crate) fn call_list_method(
        &mut self,
        items: &Rc<RefCell<Vec<Value>>>,
        method: ListMethod,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match method {
            ListMethod::Append => {
                let [value] = <[Value; 1]>::try_from(args).map_err(|args| {
                    RuntimeError::type_error(
                        format!("list.append() takes exactly one argument ({} given)", args.len()),
                        location,
                    )
                })?;
                items.borrow_mut().push(value);
                Ok(Value::None)
            }
            ListMethod::Pop => {
                let len = items.borrow().len();
                if len == 0 {
                    return Err(RuntimeError::exception(
                        "IndexError",
                        "pop from empty list",
                        location,
                    ));
                }
                let position = match optional_arg("pop", &args, location)? {
                    None => len - 1,
                    Some(index) => self.resolve_index(index, len, "pop", location)?,
                };
                Ok(items.borrow_mut().remove(position))
            }
        }
    }
}

fn single_arg<'a>(
    name: &str,
    args: &'a [Value],
    location: SourceLocation,
) -> Result<&'a Value, RuntimeError> {
    match args {
        [value] => Ok(value),
        _ => Err(RuntimeError::type_error(
            format!("{}() takes exactly one argument ({} given)", name, args.len()),
            location,
        )),
    }
}

fn optional_arg<'a>(
    name: &str,
    args: &'a [Value],
    location: SourceLocation,
) -> Result<Option<&'a Value>, RuntimeError> {
    match args {
        [] => Ok(None),
        [value] => Ok(Some(value)),
        _ => Err(RuntimeError::type_error(
            format!("{}() takes at most 1 argument ({} given)", name, args.len()),
            location,
        )),
    }
}

fn builtin_range(args: &[Value], location: SourceLocation) -> Result<Value, RuntimeError> {
    let mut bounds = Vec::with_capacity(args.len());
    for arg in args {
        bounds.push(arg.as_int().ok_or_else(|| {
            RuntimeError::type_error(
                format!(
                    "'{}' object cannot be interpreted as an integer",
                    arg.type_name()
                ),
                location,
            )
        })?);
    }

    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        [] => {
            return Err(RuntimeError::type_error(
                "range expected at least 1 argument, got 0",
                location,
            ))
        }
        _ => {
            return Err(RuntimeError::type_error(
                format!("range expected at most 3 arguments, got {}", args.len()),
                location,
            ))
        }
    };

    if step == 0 {
        return Err(RuntimeError::value_error(
            "range() arg 3 must not be zero",
            location,
        ));
    }
    Ok(Value::Range { start, stop, step })
}

fn to_int(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value {
        Value::Float(x) => {
            if x.is_nan() {
                return Err(RuntimeError::value_error(
                    "cannot convert float NaN to integer",
                    location,
                ));
            }
            let truncated = x.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            if truncated.is_infinite()
                || truncated < i64::MIN as f64
                || truncated >= i64::MAX as f64
            {
                return Err(RuntimeError::exception(
                    "OverflowError",
                    "cannot convert float to integer",
                    location,
                ));
            }
            Ok(Value::Int(truncated as i64))
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                RuntimeError::value_error(
                    format!("invalid literal for int() with base 10: {}", value.repr()),
                    location,
                )
            }),
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            RuntimeError::type_error(
                format!(
                    "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                    other.type_name()
                ),
                location,
            )
        }),
    }
}

fn to_float(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| {
                RuntimeError::value_error(
                    format!("could not convert string to float: {}", value.repr()),
                    location,
                )
            }),
        other => other.as_float().map(Value::Float).ok_or_else(|| {
            RuntimeError::type_error(
                format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ),
                location,
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{ExecConfig, Interpreter, DEFAULT_MAX_DEPTH};
    use crate::interpreter::errors::RuntimeError;
    use crate::parser::parse_module;
    use std::time::Duration;

    fn output_of(source: &str) -> Vec<String> {
        let mut interp = Interpreter::from_source(source).expect("parse failed");
        interp.run().expect("run failed");
        interp.output().get_output()
    }

    fn error_of(source: &str) -> String {
        let mut interp = Interpreter::from_source(source).expect("parse failed");
        interp.run().expect_err("expected an error").to_string()
    }

    #[test]
    fn test_print_joins_with_spaces() {
        assert_eq!(output_of("print('a', 1, 2.5, None)\n"), vec!["a 1 2.5 None"]);
        assert_eq!(output_of("print()\n"), vec![""]);
    }

    #[test]
    fn test_range_and_len() {
        assert_eq!(
            output_of("print(list(range(3)), len(range(1, 10, 2)), len('héllo'))\n"),
            vec!["[0, 1, 2] 5 5"]
        );
        assert_eq!(
            error_of("range(1, 2, 0)\n"),
            "ValueError: range() arg 3 must not be zero (line 1)"
        );
    }

    #[test]
    fn test_min_max_sum() {
        assert_eq!(
            output_of("print(min(3, 1, 2), max([4, 9, 2]), sum([1, 2, 3]), sum([], 10))\n"),
            vec!["1 9 6 10"]
        );
        assert_eq!(
            error_of("max([])\n"),
            "ValueError: max() arg is an empty sequence (line 1)"
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            output_of("print(int(' 42 '), int(3.9), int(-3.9), float('2.5'), str(10), bool(''))\n"),
            vec!["42 3 -3 2.5 10 False"]
        );
        assert_eq!(
            error_of("int('abc')\n"),
            "ValueError: invalid literal for int() with base 10: 'abc' (line 1)"
        );
        assert_eq!(
            error_of("float('x')\n"),
            "ValueError: could not convert string to float: 'x' (line 1)"
        );
    }

    #[test]
    fn test_len_of_int() {
        assert_eq!(
            error_of("len(5)\n"),
            "TypeError: object of type 'int' has no len() (line 1)"
        );
    }

    #[test]
    fn test_pop() {
        assert_eq!(
            output_of("a = [1, 2, 3]\nprint(a.pop(0), a.pop(), a)\n"),
            vec!["1 3 [2]"]
        );
        assert_eq!(
            error_of("[].pop()\n"),
            "IndexError: pop from empty list (line 1)"
        );
    }

    #[test]
    fn test_materializing_huge_ranges_is_memory_error() {
        assert!(error_of("x = list(range(10 ** 11))\n").starts_with("MemoryError"));
        assert!(error_of("x = [1]\nx += range(10 ** 11)\n").starts_with("MemoryError"));
    }

    #[test]
    fn test_unpacking_stops_after_one_extra_item() {
        assert_eq!(
            error_of("a, b = range(10 ** 12)\n"),
            "ValueError: too many values to unpack (expected 2) (line 1)"
        );
    }

    #[test]
    fn test_deadline_checked_inside_builtins() {
        for source in ["x = sum(range(10 ** 12))\n", "x = max(range(10 ** 12))\n"] {
            let module = parse_module(source).expect("parse failed");
            let mut interp = Interpreter::with_config(
                module,
                ExecConfig {
                    deadline: Some(Duration::from_millis(50)),
                    max_depth: DEFAULT_MAX_DEPTH,
                },
            );
            assert!(
                matches!(interp.run(), Err(RuntimeError::DeadlineExceeded { .. })),
                "deadline not enforced for {:?}",
                source
            );
        }
    }
}
