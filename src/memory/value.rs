//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! of the scripting language. Mutable containers share their storage through `Rc`,
//! so aliasing (`b = a; b.append(1)`) behaves as in the source language.
//!
//! # Value Types
//!
//! - Scalars: [`Value::None`], [`Value::Bool`], [`Value::Int`] (64-bit, checked),
//!   [`Value::Float`], [`Value::Str`]
//! - Sequences: [`Value::List`] (mutable, shared), [`Value::Tuple`], [`Value::Range`]
//! - Callables: [`Value::Function`], [`Value::Builtin`], [`Value::ListMethod`],
//!   [`Value::ExceptionType`]
//! - [`Value::Class`]: a class body's namespace (attribute access only)
//! - [`Value::Exception`]: an exception instance bound by `except ... as name`

use crate::memory::stack::Scope;
use crate::parser::ast::FunctionDef;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<[Value]>),
    Range {
        start: i64,
        stop: i64,
        step: i64,
    },
    Function(Rc<Function>),
    Builtin(Builtin),
    ListMethod(Rc<RefCell<Vec<Value>>>, ListMethod),
    Class(Rc<Class>),
    ExceptionType(Rc<str>),
    Exception(Rc<ExceptionValue>),
}

/// A user-defined function closed over its defining scope
pub struct Function {
    pub def: Rc<FunctionDef>,
    /// Default values, aligned with the trailing parameters
    pub defaults: Vec<Value>,
    /// Enclosing function scope; `None` for module-level functions
    pub closure: Option<Rc<Scope>>,
}

impl Function {
    /// Number of parameters without a default
    pub fn required_params(&self) -> usize {
        self.def.params.len() - self.defaults.len()
    }
}

pub struct Class {
    pub name: Rc<str>,
    pub namespace: Rc<Scope>,
    /// Derives from an exception class; calling it creates an exception instance
    pub is_exception: bool,
}

// Closures can reach the function itself, so Debug stays shallow
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.def.name)
            .field("code", &self.def.code)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("attributes", &self.namespace.names())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionValue {
    pub kind: Rc<str>,
    pub message: String,
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Range,
    Len,
    Abs,
    Min,
    Max,
    Int,
    Str,
    Bool,
    Float,
    List,
    Sum,
}

impl Builtin {
    pub const ALL: [Builtin; 12] = [
        Builtin::Print,
        Builtin::Range,
        Builtin::Len,
        Builtin::Abs,
        Builtin::Min,
        Builtin::Max,
        Builtin::Int,
        Builtin::Str,
        Builtin::Bool,
        Builtin::Float,
        Builtin::List,
        Builtin::Sum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Int => "int",
            Builtin::Str => "str",
            Builtin::Bool => "bool",
            Builtin::Float => "float",
            Builtin::List => "list",
            Builtin::Sum => "sum",
        }
    }
}

/// Methods available on list objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Append,
    Pop,
}

impl ListMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "append" => Some(ListMethod::Append),
            "pop" => Some(ListMethod::Pop),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListMethod::Append => "append",
            ListMethod::Pop => "pop",
        }
    }
}

/// Built-in exception classes, with their parent class
pub const EXCEPTION_TYPES: &[(&str, Option<&str>)] = &[
    ("BaseException", None),
    ("Exception", Some("BaseException")),
    ("ArithmeticError", Some("Exception")),
    ("ZeroDivisionError", Some("ArithmeticError")),
    ("OverflowError", Some("ArithmeticError")),
    ("LookupError", Some("Exception")),
    ("IndexError", Some("LookupError")),
    ("KeyError", Some("LookupError")),
    ("NameError", Some("Exception")),
    ("UnboundLocalError", Some("NameError")),
    ("TypeError", Some("Exception")),
    ("ValueError", Some("Exception")),
    ("AttributeError", Some("Exception")),
    ("AssertionError", Some("Exception")),
    ("ImportError", Some("Exception")),
    ("ModuleNotFoundError", Some("ImportError")),
    ("RuntimeError", Some("Exception")),
    ("RecursionError", Some("RuntimeError")),
    ("NotImplementedError", Some("RuntimeError")),
    ("MemoryError", Some("Exception")),
];

/// Whether an exception of class `kind` is caught by a handler for `handler`.
///
/// User-defined exception names have no known parent and only match
/// themselves, `Exception` and `BaseException`.
pub fn exception_matches(kind: &str, handler: &str) -> bool {
    if handler == "BaseException" || handler == "Exception" {
        return true;
    }

    let mut current = Some(kind);
    while let Some(name) = current {
        if name == handler {
            return true;
        }
        current = EXCEPTION_TYPES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .and_then(|(_, parent)| *parent);
    }
    false
}

/// Iterator over the elements of an iterable value
pub enum ValueIter {
    Items(std::vec::IntoIter<Value>),
    Range { next: i64, stop: i64, step: i64 },
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Items(items) => items.next(),
            ValueIter::Range { next, stop, step } => {
                let more = if *step > 0 { *next < *stop } else { *next > *stop };
                if !more {
                    return None;
                }
                let current = *next;
                // Saturate so a range ending near i64::MAX still terminates
                *next = next.checked_add(*step).unwrap_or(*stop);
                Some(Value::Int(current))
            }
        }
    }
}

/// Number of elements in `range(start, stop, step)`
pub fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (lo, hi, step) = if step > 0 {
        (start as i128, stop as i128, step as i128)
    } else {
        (stop as i128, start as i128, -(step as i128))
    };
    if lo >= hi || step == 0 {
        0
    } else {
        ((hi - lo + step - 1) / step) as usize
    }
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::from(items))
    }

    /// The source-language type name, as used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::ListMethod(..) => "builtin_function_or_method",
            Value::Class(_) | Value::ExceptionType(_) => "type",
            Value::Exception(exc) => &exc.kind,
        }
    }

    /// Truth value testing
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
            _ => true,
        }
    }

    /// Integer view of ints and bools
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of any numeric value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            other => other.as_int().map(|n| n as f64),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Bool(_) | Value::Float(_))
    }

    /// Iterate the elements of a sequence; `None` if the value is not iterable
    pub fn iter(&self) -> Option<ValueIter> {
        let items = match self {
            Value::List(items) => items.borrow().clone(),
            Value::Tuple(items) => items.to_vec(),
            Value::Str(s) => s.chars().map(|c| Value::Str(Rc::from(c.to_string()))).collect(),
            Value::Range { start, stop, step } => {
                return Some(ValueIter::Range {
                    next: *start,
                    stop: *stop,
                    step: *step,
                })
            }
            _ => return None,
        };
        Some(ValueIter::Items(items.into_iter()))
    }

    /// Equality as the `==` operator sees it
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || sequences_equal(&a.borrow(), &b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => sequences_equal(a, b),
            (
                Value::Range {
                    start: a1,
                    stop: a2,
                    step: a3,
                },
                Value::Range {
                    start: b1,
                    stop: b2,
                    step: b3,
                },
            ) => (a1, a2, a3) == (b1, b2, b3),
            (Value::Float(_), _) | (_, Value::Float(_))
                if self.is_number() && other.is_number() =>
            {
                self.as_float() == other.as_float()
            }
            (a, b) if a.is_number() && b.is_number() => a.as_int() == b.as_int(),
            _ => self.is_same(other),
        }
    }

    /// Identity as the `is` operator sees it
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `repr()` of the value
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            Value::Exception(exc) if exc.message.is_empty() => format!("{}()", exc.kind),
            Value::Exception(exc) => format!("{}({})", exc.kind, quote(&exc.message)),
            other => other.to_string(),
        }
    }
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

/// Quote a string the way the source language's `repr` does
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        let shortest = format!("{:e}", x);
        let Some((mantissa, exponent)) = shortest.split_once('e') else {
            return shortest;
        };
        let exponent: i32 = exponent.parse().unwrap_or(0);
        if (-4..16).contains(&exponent) {
            // Debug keeps a trailing ".0" on integral floats
            format!("{:?}", x)
        } else {
            // Signed exponent, at least two digits
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.repr())?;
    }
    Ok(())
}

/// `str()` of the value
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                write_items(f, &items.borrow())?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    write!(f, "range({}, {})", start, stop)
                } else {
                    write!(f, "range({}, {}, {})", start, stop, step)
                }
            }
            Value::Function(func) => write!(f, "<function {}>", func.def.name),
            Value::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name()),
            Value::ListMethod(_, method) => {
                write!(f, "<built-in method {} of list object>", method.name())
            }
            Value::Class(class) => write!(f, "<class '{}'>", class.name),
            Value::ExceptionType(kind) => write!(f, "<class '{}'>", kind),
            Value::Exception(exc) => write!(f, "{}", exc.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_source_language() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(1e20).to_string(), "1e+20");
        assert_eq!(Value::Float(1e16).to_string(), "1e+16");
        assert_eq!(Value::Float(1e15).to_string(), "1000000000000000.0");
        assert_eq!(Value::Float(-2.5e300).to_string(), "-2.5e+300");
        assert_eq!(Value::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Float(1.5e-7).to_string(), "1.5e-07");
        assert_eq!(Value::Float(-0.0).to_string(), "-0.0");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::str("a")]).to_string(),
            "[1, 'a']"
        );
        assert_eq!(Value::tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::str("it's").repr(), "\"it's\"");
        assert_eq!(Value::str("a\nb").repr(), "'a\\nb'");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::Range {
            start: 3,
            stop: 3,
            step: 1
        }
        .is_truthy());
    }

    #[test]
    fn test_numeric_equality_crosses_types() {
        assert!(Value::Int(1).equals(&Value::Float(1.0)));
        assert!(Value::Bool(true).equals(&Value::Int(1)));
        assert!(!Value::Int(1).equals(&Value::str("1")));
        assert!(Value::list(vec![Value::Int(1)]).equals(&Value::list(vec![Value::Float(1.0)])));
    }

    #[test]
    fn test_range_iteration_and_length() {
        let up: Vec<i64> = Value::Range {
            start: 0,
            stop: 5,
            step: 2,
        }
        .iter()
        .unwrap()
        .filter_map(|v| v.as_int())
        .collect();
        assert_eq!(up, vec![0, 2, 4]);

        let down: Vec<i64> = Value::Range {
            start: 3,
            stop: 0,
            step: -1,
        }
        .iter()
        .unwrap()
        .filter_map(|v| v.as_int())
        .collect();
        assert_eq!(down, vec![3, 2, 1]);

        assert_eq!(range_len(0, 5, 2), 3);
        assert_eq!(range_len(3, 0, -1), 3);
        assert_eq!(range_len(5, 0, 1), 0);
    }

    #[test]
    fn test_exception_hierarchy() {
        assert!(exception_matches("ZeroDivisionError", "ArithmeticError"));
        assert!(exception_matches("ModuleNotFoundError", "ImportError"));
        assert!(exception_matches("UnboundLocalError", "NameError"));
        assert!(exception_matches("MyError", "Exception"));
        assert!(!exception_matches("ValueError", "TypeError"));
        assert!(!exception_matches("IndexError", "ArithmeticError"));
    }
}
