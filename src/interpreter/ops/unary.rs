use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{SourceLocation, UnaryOp};

pub(crate) fn unary_op(
    op: UnaryOp,
    operand: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Float(x) => Ok(Value::Float(-x)),
            other => match other.as_int() {
                Some(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                    RuntimeError::exception("OverflowError", "integer overflow", location)
                }),
                None => Err(bad_operand("-", other, location)),
            },
        },
        UnaryOp::Pos => match operand {
            Value::Float(x) => Ok(Value::Float(*x)),
            other => other
                .as_int()
                .map(Value::Int)
                .ok_or_else(|| bad_operand("+", other, location)),
        },
    }
}

fn bad_operand(symbol: &str, operand: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ),
        location,
    )
}
