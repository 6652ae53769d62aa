use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{range_len, Value};
use crate::parser::ast::{CmpOp, SourceLocation};
use std::cmp::Ordering;

/// Evaluate one link of a comparison chain
pub(crate) fn compare(
    op: CmpOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => Ok(left.equals(right)),
        CmpOp::NotEq => Ok(!left.equals(right)),
        CmpOp::Is => Ok(left.is_same(right)),
        CmpOp::IsNot => Ok(!left.is_same(right)),
        CmpOp::In => contains(right, left, location),
        CmpOp::NotIn => Ok(!contains(right, left, location)?),
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            // `None` means unordered (NaN), which makes every ordering false
            let Some(ordering) = order(op, left, right, location)? else {
                return Ok(false);
            };
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::LtE => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn order(
    op: CmpOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Option<Ordering>, RuntimeError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => order_items(op, &a.borrow(), &b.borrow(), location),
        (Value::Tuple(a), Value::Tuple(b)) => order_items(op, a, b, location),
        _ => match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => Ok(Some(a.cmp(&b))),
            _ => match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
                _ => Err(RuntimeError::type_error(
                    format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op.symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                    location,
                )),
            },
        },
    }
}

/// Lexicographic order: the first unequal pair decides, then length
fn order_items(
    op: CmpOp,
    a: &[Value],
    b: &[Value],
    location: SourceLocation,
) -> Result<Option<Ordering>, RuntimeError> {
    for (x, y) in a.iter().zip(b) {
        if !x.equals(y) {
            return order(op, x, y, location);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// `item in container`
fn contains(
    container: &Value,
    item: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match container {
        Value::List(items) => Ok(items.borrow().iter().any(|x| x.equals(item))),
        Value::Tuple(items) => Ok(items.iter().any(|x| x.equals(item))),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(RuntimeError::type_error(
                format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ),
                location,
            )),
        },
        Value::Range { start, stop, step } => Ok(match item.as_int() {
            Some(n) => {
                let offset = i128::from(n) - i128::from(*start);
                let stride = i128::from(*step);
                let len = range_len(*start, *stop, *step) as i128;
                offset % stride == 0 && (0..len).contains(&(offset / stride))
            }
            None => false,
        }),
        other => Err(RuntimeError::type_error(
            format!("argument of type '{}' is not iterable", other.type_name()),
            location,
        )),
    }
}
