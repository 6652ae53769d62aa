// Integration tests for the script interpreter and its trace events

use linecov::interpreter::{ExecConfig, Interpreter, RuntimeError};
use linecov::memory::value::Value;
use linecov::trace::{FrameInfo, SinkError, TraceControl, TraceEvent, TraceSink};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn run_output(source: &str) -> Vec<String> {
    let mut interpreter = Interpreter::from_source(source).expect("Parsing failed");
    let result = interpreter.run();
    assert!(result.is_ok(), "Execution failed: {:?}", result);
    interpreter.output().get_output()
}

fn run_error(source: &str) -> RuntimeError {
    let mut interpreter = Interpreter::from_source(source).expect("Parsing failed");
    interpreter.run().expect_err("Execution should fail")
}

type EventLog = Rc<RefCell<Vec<(TraceEvent, String, usize)>>>;

/// Sink that logs every event and detaches from frames named `skip`
struct Recorder {
    events: EventLog,
    skip: Option<&'static str>,
}

impl TraceSink for Recorder {
    fn on_event(
        &mut self,
        frame: &FrameInfo,
        event: TraceEvent,
    ) -> Result<TraceControl, SinkError> {
        self.events
            .borrow_mut()
            .push((event, frame.function.to_string(), frame.line));
        if event == TraceEvent::Call && self.skip == Some(&*frame.function) {
            return Ok(TraceControl::Detach);
        }
        Ok(TraceControl::Continue)
    }
}

fn record(source: &str, skip: Option<&'static str>) -> Vec<(TraceEvent, String, usize)> {
    let mut interpreter = Interpreter::from_source(source).expect("Parsing failed");
    let events = EventLog::default();
    interpreter.set_trace(Box::new(Recorder {
        events: Rc::clone(&events),
        skip,
    }));
    interpreter.run().expect("Execution failed");
    let recorded = events.borrow().clone();
    recorded
}

#[test]
fn test_try_except_else_finally() {
    let source = r#"
log = []
def risky(n):
    try:
        if n == 0:
            raise ValueError("zero")
        log.append("ok")
    except ValueError as e:
        log.append(str(e))
    else:
        log.append("else")
    finally:
        log.append("finally")
risky(0)
risky(1)
print(log)
"#;
    assert_eq!(
        run_output(source),
        vec!["['zero', 'finally', 'ok', 'else', 'finally']"]
    );
}

#[test]
fn test_bare_raise_and_handler_order() {
    let source = r#"
def inner():
    try:
        x = 1 // 0
    except ZeroDivisionError:
        raise
try:
    inner()
except ValueError:
    print("wrong handler")
except ArithmeticError as err:
    print("caught", err)
"#;
    assert_eq!(run_output(source), vec!["caught integer division or modulo by zero"]);
}

#[test]
fn test_user_exception_class() {
    let source = r#"
class Empty(Exception):
    pass
def first(items):
    if len(items) == 0:
        raise Empty("no items")
    return items[0]
try:
    first([])
except Empty as e:
    print(e)
print(first([7, 8]))
"#;
    assert_eq!(run_output(source), vec!["no items", "7"]);
}

#[test]
fn test_finally_return_discards_exception() {
    let source = r#"
def swallow():
    try:
        raise KeyError("k")
    finally:
        return "done"
print(swallow())
"#;
    assert_eq!(run_output(source), vec!["done"]);
}

#[test]
fn test_uncaught_exception_reports_kind_and_line() {
    let err = run_error("x = 1\ny = [1, 2]\nz = y[5]\n");
    assert_eq!(err.exception_kind(), Some("IndexError"));
    assert_eq!(err.to_string(), "IndexError: list index out of range (line 3)");
}

#[test]
fn test_global_and_nonlocal() {
    let source = r#"
counter = 0
def bump():
    global counter
    counter += 1
bump()
bump()

def make_adder():
    total = 0
    def add(n):
        nonlocal total
        total += n
        return total
    return add
adder = make_adder()
adder(2)
result = adder(3)
"#;
    let mut interpreter = Interpreter::from_source(source).unwrap();
    interpreter.run().unwrap();
    assert_eq!(interpreter.global("counter").map(|v| v.to_string()), Some("2".to_string()));
    assert_eq!(interpreter.global("result").map(|v| v.to_string()), Some("5".to_string()));
    assert!(interpreter.global("total").is_none());
}

#[test]
fn test_unbound_local() {
    let source = "x = 1\ndef f():\n    print(x)\n    x = 2\nf()\n";
    assert_eq!(run_error(source).exception_kind(), Some("UnboundLocalError"));
}

#[test]
fn test_class_namespace_and_decorator() {
    let source = r#"
def twice(f):
    def wrapper(n):
        return f(f(n))
    return wrapper

class Config:
    """Settings."""
    scale = 3
    def apply(n):
        return n * Config.scale

@twice
def inc(n):
    return n + 1

print(Config.apply(2), inc(5))
"#;
    assert_eq!(run_output(source), vec!["6 7"]);
}

#[test]
fn test_loops_with_else() {
    let source = r#"
for i in range(3):
    if i == 5:
        break
else:
    print("no break")
n = 0
while n < 10:
    n += 1
    if n == 4:
        break
    if n % 2 == 1:
        continue
    print("even", n)
else:
    print("unreachable")
print("n =", n)
"#;
    assert_eq!(run_output(source), vec!["no break", "even 2", "n = 4"]);
}

#[test]
fn test_tuple_unpacking_and_augmented_list() {
    let source = r#"
a, b = 1, 2
a, b = b, a
items = [a]
alias = items
items += [b, 3]
print(a, b, alias, sum(alias))
"#;
    assert_eq!(run_output(source), vec!["2 1 [2, 1, 3] 6"]);
}

#[test]
fn test_unpacking_mismatch() {
    let err = run_error("a, b = [1, 2, 3]\n");
    assert_eq!(err.exception_kind(), Some("ValueError"));
    assert!(err.to_string().contains("too many values to unpack"));
}

#[test]
fn test_import_and_with_are_errors() {
    assert_eq!(run_error("import os\n").exception_kind(), Some("ModuleNotFoundError"));
    assert_eq!(run_error("with 1:\n    pass\n").exception_kind(), Some("TypeError"));
}

#[test]
fn test_trace_event_sequence() {
    let source = "def f(x):\n    y = x + 1\n    return y\nz = f(1)\n";
    let events = record(source, None);

    let kinds: Vec<(TraceEvent, &str)> = events
        .iter()
        .map(|(event, function, _)| (*event, function.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TraceEvent::Call, "<module>"),
            (TraceEvent::Line, "<module>"),
            (TraceEvent::Line, "<module>"),
            (TraceEvent::Call, "f"),
            (TraceEvent::Line, "f"),
            (TraceEvent::Line, "f"),
            (TraceEvent::Return, "f"),
            (TraceEvent::Return, "<module>"),
        ]
    );

    let lines: Vec<usize> = events
        .iter()
        .filter(|(event, _, _)| *event == TraceEvent::Line)
        .map(|(_, _, line)| *line)
        .collect();
    assert_eq!(lines, vec![1, 4, 2, 3]);
}

#[test]
fn test_detached_frame_fires_only_call() {
    let source = "def f(x):\n    y = x + 1\n    return y\nz = f(1)\n";
    let events = record(source, Some("f"));

    let in_f: Vec<TraceEvent> = events
        .iter()
        .filter(|(_, function, _)| function == "f")
        .map(|(event, _, _)| *event)
        .collect();
    assert_eq!(in_f, vec![TraceEvent::Call]);
    assert_eq!(events.last().map(|(event, _, _)| *event), Some(TraceEvent::Return));
}

#[test]
fn test_exception_events_per_frame() {
    let source = r#"def g():
    raise ValueError("bad")
try:
    g()
except ValueError:
    pass
"#;
    let events = record(source, None);
    let sequence: Vec<(TraceEvent, &str, usize)> = events
        .iter()
        .map(|(event, function, line)| (*event, function.as_str(), *line))
        .filter(|(event, _, _)| *event != TraceEvent::Call)
        .collect();

    assert_eq!(
        sequence,
        vec![
            (TraceEvent::Line, "<module>", 1),
            (TraceEvent::Line, "<module>", 3),
            (TraceEvent::Line, "<module>", 4),
            (TraceEvent::Line, "g", 2),
            (TraceEvent::Exception, "g", 2),
            (TraceEvent::Return, "g", 2),
            (TraceEvent::Exception, "<module>", 4),
            (TraceEvent::Line, "<module>", 5),
            (TraceEvent::Line, "<module>", 6),
            (TraceEvent::Return, "<module>", 6),
        ]
    );
}

#[test]
fn test_call_from_host_traces_only_callee() {
    let source = "def double(n):\n    return n * 2\n";
    let mut interpreter = Interpreter::from_source(source).unwrap();
    interpreter.run().unwrap();

    let events = EventLog::default();
    interpreter.set_trace(Box::new(Recorder {
        events: Rc::clone(&events),
        skip: None,
    }));
    let value = interpreter.call("double", vec![Value::Int(21)]).unwrap();

    assert_eq!(value.to_string(), "42");
    assert!(events
        .borrow()
        .iter()
        .all(|(_, function, _)| function == "double"));
}

#[test]
fn test_recursion_limit_is_catchable() {
    let source = r#"
def down(n):
    return down(n + 1)
try:
    down(0)
except RecursionError:
    print("too deep")
"#;
    let mut interpreter = Interpreter::with_config(
        linecov::parser::parse_module(source).unwrap(),
        ExecConfig {
            deadline: Some(Duration::from_secs(10)),
            max_depth: 50,
        },
    );
    interpreter.run().unwrap();
    assert_eq!(interpreter.output().get_output(), vec!["too deep"]);
}

#[test]
fn test_deep_recursion_raises_recursion_error() {
    let source = r#"
def f(n):
    if n == 0:
        return 0
    return 1 + f(n - 1)
result = f(input_value)
"#;
    let mut interpreter = Interpreter::from_source(source).unwrap();
    interpreter.bind("input_value", Value::Int(5000));
    let err = interpreter.run().expect_err("recursion should hit the depth limit");
    assert_eq!(err.exception_kind(), Some("RecursionError"));
}

#[test]
fn test_recursion_through_nested_blocks_below_limit() {
    let source = r#"
def f(n):
    if n == 0:
        return 0
    total = 0
    for i in range(1):
        while True:
            try:
                total = 1 + f(n - 1)
            finally:
                pass
            break
    return total
result = f(900)
"#;
    let mut interpreter = Interpreter::from_source(source).unwrap();
    interpreter.run().unwrap();
    assert_eq!(interpreter.global("result").map(|v| v.to_string()), Some("900".to_string()));
}

#[test]
fn test_line_events_for_declarations_decorators_and_classes() {
    let source = r#"def deco(f):
    return f
counter = 0
@deco
def g():
    global counter
    counter += 1
g()
class E(Exception):
    """Doc."""
    code = 1
"#;
    let lines: Vec<(String, usize)> = record(source, None)
        .into_iter()
        .filter(|(event, _, _)| *event == TraceEvent::Line)
        .map(|(_, function, line)| (function, line))
        .collect();
    let expected: Vec<(String, usize)> = [
        ("<module>", 1),
        ("<module>", 3),
        ("<module>", 4),
        ("<module>", 5),
        ("deco", 2),
        ("<module>", 8),
        ("g", 7),
        ("<module>", 9),
        ("E", 9),
        ("E", 10),
        ("E", 11),
    ]
    .iter()
    .map(|(function, line)| (function.to_string(), *line))
    .collect();
    assert_eq!(lines, expected);
}
