// Coverage of the factorial demo script

use linecov::analysis::count_source;
use linecov::interpreter::Interpreter;
use linecov::memory::value::Value;
use linecov::trace::{
    format_coverage, FrameInfo, LineHit, SinkError, TraceControl, TraceEvent, TraceSink, Tracer,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

const FACTORIAL_SCRIPT: &str = include_str!("../demos/factorial.py");

fn traced_run(source: &str, input: i64) -> (BTreeSet<LineHit>, Vec<String>) {
    let mut interp = Interpreter::from_source(source).expect("Parsing failed");
    interp.bind("input_value", Value::Int(input));

    let tracer = Tracer::new();
    {
        let mut scope = tracer.enter(&mut interp).expect("Tracer entry failed");
        scope.run().expect("Execution failed");
    }
    (tracer.coverage(), interp.output().get_output())
}

fn lines_in(coverage: &BTreeSet<LineHit>, function: &str) -> Vec<usize> {
    coverage
        .iter()
        .filter(|hit| &*hit.function == function)
        .map(|hit| hit.line)
        .collect()
}

/// Sink that remembers every line event it sees
struct LineLog {
    lines: Rc<RefCell<Vec<(String, usize)>>>,
}

impl TraceSink for LineLog {
    fn on_event(
        &mut self,
        frame: &FrameInfo,
        event: TraceEvent,
    ) -> Result<TraceControl, SinkError> {
        if event == TraceEvent::Line {
            self.lines
                .borrow_mut()
                .push((frame.function.to_string(), frame.line));
        }
        Ok(TraceControl::Continue)
    }
}

#[test]
fn test_factorial_function_statement_count() {
    let function_only: Vec<&str> = FACTORIAL_SCRIPT.lines().take(17).collect();
    assert_eq!(count_source(&function_only.join("\n")).unwrap(), 11);

    // The driver adds one assignment; `print(result)` is not counted
    assert_eq!(count_source(FACTORIAL_SCRIPT).unwrap(), 12);
}

#[test]
fn test_factorial_of_three() {
    let (coverage, output) = traced_run(FACTORIAL_SCRIPT, 3);

    assert_eq!(
        lines_in(&coverage, "factorial"),
        vec![6, 9, 10, 11, 12, 13, 15, 16, 17]
    );
    assert_eq!(lines_in(&coverage, "<module>"), vec![1, 18, 19]);
    assert_eq!(output, vec!["6"]);

    // Docstring lines never execute
    assert!(coverage.iter().all(|hit| !(2..=5).contains(&hit.line)));
}

#[test]
fn test_factorial_negative_input() {
    let (coverage, output) = traced_run(FACTORIAL_SCRIPT, -1);

    assert_eq!(lines_in(&coverage, "factorial"), vec![6, 7]);
    assert_eq!(output, vec!["None"]);
    assert_eq!(coverage.len(), 5);
}

#[test]
fn test_factorial_of_one_skips_loop_body() {
    let (coverage, output) = traced_run(FACTORIAL_SCRIPT, 1);

    assert_eq!(
        lines_in(&coverage, "factorial"),
        vec![6, 9, 10, 11, 12, 13, 17]
    );
    assert_eq!(output, vec!["1"]);
}

#[test]
fn test_same_input_gives_same_coverage() {
    let (first, _) = traced_run(FACTORIAL_SCRIPT, 5);
    let (second, _) = traced_run(FACTORIAL_SCRIPT, 5);
    assert_eq!(first, second);
    assert_eq!(format_coverage(&first), format_coverage(&second));
}

#[test]
fn test_coverage_set_notation() {
    let (coverage, _) = traced_run(FACTORIAL_SCRIPT, -1);
    assert_eq!(
        format_coverage(&coverage),
        "{('<module>', 1), ('<module>', 18), ('<module>', 19), ('factorial', 6), ('factorial', 7)}"
    );
}

#[test]
fn test_loop_headers_repeat_in_log() {
    let mut interp = Interpreter::from_source(FACTORIAL_SCRIPT).unwrap();
    interp.bind("input_value", Value::Int(3));
    let tracer = Tracer::new();
    {
        let mut scope = tracer.enter(&mut interp).unwrap();
        scope.run().unwrap();
    }

    let while_tests = tracer
        .log()
        .iter()
        .filter(|hit| &*hit.function == "factorial" && hit.line == 11)
        .count();
    assert_eq!(while_tests, 3);
}

#[test]
fn test_nested_tracers_share_events() {
    let mut interp = Interpreter::from_source(FACTORIAL_SCRIPT).unwrap();
    interp.bind("input_value", Value::Int(3));

    let outer = Tracer::new();
    let inner = Tracer::new();
    {
        let mut outer_scope = outer.enter(&mut interp).unwrap();
        {
            let mut inner_scope = inner.enter(&mut outer_scope).unwrap();
            inner_scope.run().unwrap();
        }
        assert!(!inner.is_active());
        assert!(outer.is_active());
        assert!(outer_scope.has_trace());
    }

    assert_eq!(outer.coverage(), inner.coverage());
    assert!(!interp.has_trace());
}

#[test]
fn test_prior_sink_sees_traced_lines_and_returns() {
    let mut interp = Interpreter::from_source(FACTORIAL_SCRIPT).unwrap();
    interp.bind("input_value", Value::Int(-1));

    let seen = Rc::new(RefCell::new(Vec::new()));
    interp.set_trace(Box::new(LineLog {
        lines: Rc::clone(&seen),
    }));

    let tracer = Tracer::new();
    {
        let mut scope = tracer.enter(&mut interp).unwrap();
        scope.run().unwrap();
    }

    let recorded: Vec<(String, usize)> = tracer
        .log()
        .iter()
        .map(|hit| (hit.function.to_string(), hit.line))
        .collect();
    assert_eq!(*seen.borrow(), recorded);
    assert!(interp.has_trace(), "prior sink was not restored");
}
