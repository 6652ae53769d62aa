use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{BinOp, SourceLocation};

/// Longest string, list or tuple an operator may build
pub(crate) const MAX_SEQUENCE_LEN: usize = 10_000_000;

/// Apply an arithmetic operator.
///
/// `bool` operands act as `0`/`1`. Mixing an int and a float gives a float.
pub(crate) fn binary_op(
    op: BinOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (left.as_int(), right.as_int()) {
        (Some(a), Some(b)) => int_op(op, a, b, location),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => float_op(op, a, b, location),
            _ => sequence_op(op, left, right, location),
        },
    }
}

fn overflow(location: SourceLocation) -> RuntimeError {
    RuntimeError::exception("OverflowError", "integer overflow", location)
}

fn zero_division(message: &str, location: SourceLocation) -> RuntimeError {
    RuntimeError::exception("ZeroDivisionError", message, location)
}

#[inline]
fn int_op(op: BinOp, a: i64, b: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(zero_division("division by zero", location));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(zero_division(
                    "integer division or modulo by zero",
                    location,
                ));
            }
            // Round toward negative infinity
            a.checked_div(b).map(|q| {
                if a % b != 0 && (a < 0) != (b < 0) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(zero_division("integer modulo by zero", location));
            }
            // The result takes the sign of the divisor
            let r = a.wrapping_rem(b);
            Some(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
        }
        BinOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(zero_division(
                        "0.0 cannot be raised to a negative power",
                        location,
                    ));
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
    };

    result.map(Value::Int).ok_or_else(|| overflow(location))
}

#[inline]
fn float_op(op: BinOp, a: f64, b: f64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(zero_division("float division by zero", location));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division("float floor division by zero", location));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(zero_division("float modulo", location));
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_division(
                    "0.0 cannot be raised to a negative power",
                    location,
                ));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(RuntimeError::Unsupported {
                    message: "complex number results".to_string(),
                    location,
                });
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

fn sequence_op(
    op: BinOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.len() + b.len(), location)?;
            Ok(Value::Str(format!("{}{}", a, b).into()))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            check_len(items.len(), location)?;
            Ok(Value::list(items))
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            check_len(a.len() + b.len(), location)?;
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinOp::Add, Value::Str(_) | Value::List(_) | Value::Tuple(_), other) => {
            Err(RuntimeError::type_error(
                format!(
                    "can only concatenate {} (not \"{}\") to {}",
                    left.type_name(),
                    other.type_name(),
                    left.type_name()
                ),
                location,
            ))
        }
        (BinOp::Mul, sequence, count) | (BinOp::Mul, count, sequence)
            if is_sequence(sequence) =>
        {
            match count.as_int() {
                Some(count) => repeat(sequence, count, location),
                None => Err(RuntimeError::type_error(
                    format!(
                        "can't multiply sequence by non-int of type '{}'",
                        count.type_name()
                    ),
                    location,
                )),
            }
        }
        _ => Err(RuntimeError::type_error(
            format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            location,
        )),
    }
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

pub(crate) fn check_len(len: usize, location: SourceLocation) -> Result<(), RuntimeError> {
    if len > MAX_SEQUENCE_LEN {
        return Err(RuntimeError::exception("MemoryError", "", location));
    }
    Ok(())
}

fn repeat(sequence: &Value, count: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let count = usize::try_from(count).unwrap_or(0);
    match sequence {
        Value::Str(s) => {
            check_len(s.len().saturating_mul(count), location)?;
            Ok(Value::Str(s.repeat(count).into()))
        }
        Value::List(items) => {
            let items = items.borrow();
            check_len(items.len().saturating_mul(count), location)?;
            Ok(Value::list(repeat_items(&items, count)))
        }
        Value::Tuple(items) => {
            check_len(items.len().saturating_mul(count), location)?;
            Ok(Value::tuple(repeat_items(items, count)))
        }
        other => Err(RuntimeError::type_error(
            format!("can't multiply sequence of type '{}'", other.type_name()),
            location,
        )),
    }
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn apply(op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
        binary_op(op, &left, &right, loc())
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        let q = apply(BinOp::FloorDiv, Value::Int(-7), Value::Int(2)).unwrap();
        let r = apply(BinOp::Mod, Value::Int(-7), Value::Int(2)).unwrap();
        assert_eq!(q.to_string(), "-4");
        assert_eq!(r.to_string(), "1");

        let r = apply(BinOp::Mod, Value::Int(7), Value::Int(-2)).unwrap();
        assert_eq!(r.to_string(), "-1");
    }

    #[test]
    fn test_true_division_is_float() {
        let v = apply(BinOp::Div, Value::Int(6), Value::Int(3)).unwrap();
        assert_eq!(v.to_string(), "2.0");
    }

    #[test]
    fn test_zero_division_messages() {
        let err = apply(BinOp::Div, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero (line 1)");

        let err = apply(BinOp::Mod, Value::Float(1.0), Value::Int(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: float modulo (line 1)");
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = apply(BinOp::Mul, Value::Int(i64::MAX), Value::Int(2)).unwrap_err();
        assert_eq!(err.exception_kind(), Some("OverflowError"));

        let err = apply(BinOp::Pow, Value::Int(10), Value::Int(40)).unwrap_err();
        assert_eq!(err.exception_kind(), Some("OverflowError"));
    }

    #[test]
    fn test_negative_exponent_gives_float() {
        let v = apply(BinOp::Pow, Value::Int(2), Value::Int(-1)).unwrap();
        assert_eq!(v.to_string(), "0.5");
    }

    #[test]
    fn test_sequence_operators() {
        let v = apply(BinOp::Add, Value::str("ab"), Value::str("cd")).unwrap();
        assert_eq!(v.to_string(), "abcd");

        let v = apply(BinOp::Mul, Value::Int(2), Value::list(vec![Value::Int(1)])).unwrap();
        assert_eq!(v.to_string(), "[1, 1]");

        let v = apply(BinOp::Mul, Value::str("x"), Value::Int(-3)).unwrap();
        assert_eq!(v.to_string(), "");
    }

    #[test]
    fn test_type_errors() {
        let err = apply(BinOp::Add, Value::str("a"), Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can only concatenate str (not \"int\") to str (line 1)"
        );

        let err = apply(BinOp::Sub, Value::Int(1), Value::str("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for -: 'int' and 'str' (line 1)"
        );
    }

    #[test]
    fn test_huge_repetition_is_memory_error() {
        let err = apply(BinOp::Mul, Value::str("ab"), Value::Int(i64::MAX)).unwrap_err();
        assert_eq!(err.exception_kind(), Some("MemoryError"));
    }
}
