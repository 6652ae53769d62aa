// Batch runs of scripts against input files

use linecov::analysis::{count_source, total_statements};
use linecov::runner::{Runner, RunnerConfig, RunnerError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FACTORIAL_SCRIPT: &str = include_str!("../demos/factorial.py");

fn write_script(dir: &Path, source: &str) -> std::path::PathBuf {
    let path = dir.join("script.py");
    fs::write(&path, source).unwrap();
    path
}

fn write_inputs(dir: &Path, inputs: &[(&str, &str)]) -> std::path::PathBuf {
    let inputs_dir = dir.join("inputs");
    fs::create_dir(&inputs_dir).unwrap();
    for (name, contents) in inputs {
        fs::write(inputs_dir.join(name), contents).unwrap();
    }
    inputs_dir
}

#[test]
fn test_directory_batch_reports_each_input() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), FACTORIAL_SCRIPT);
    let inputs = write_inputs(
        dir.path(),
        &[("c.in", "-1\n"), ("a.in", "1\n"), ("b.in", "3\nignored\n"), ("notes.txt", "5\n")],
    );

    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();
    assert_eq!(runner.total_statements(), 12);

    let batch = runner.run_all(&inputs).unwrap();
    assert_eq!(batch.len(), 3);
    assert!(batch.is_success());

    let summaries: Vec<(i64, String)> = batch
        .reports()
        .map(|report| (report.input_value, report.summary()))
        .collect();
    assert_eq!(
        summaries,
        vec![
            (1, "Statement Coverage: 83.33%".to_string()),
            (3, "Statement Coverage: 100.00%".to_string()),
            (-1, "Statement Coverage: 41.67%".to_string()),
        ]
    );

    let outputs: Vec<Vec<String>> = batch.reports().map(|report| report.output.clone()).collect();
    assert_eq!(outputs, vec![vec!["1"], vec!["6"], vec!["None"]]);
}

#[test]
fn test_malformed_input_fails_only_that_input() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), FACTORIAL_SCRIPT);
    let inputs = write_inputs(dir.path(), &[("a.in", "three\n"), ("b.in", "4\n")]);

    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();
    let batch = runner.run_all(&inputs).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.failures(), 1);
    assert!(!batch.is_success());
    match &batch.outcomes[0].result {
        Err(RunnerError::MalformedInput { line, .. }) => assert_eq!(line, "three"),
        other => panic!("expected malformed input, got {:?}", other),
    }
    assert_eq!(batch.reports().count(), 1);
}

#[test]
fn test_runtime_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "x = 10 // input_value\n");
    let inputs = write_inputs(dir.path(), &[("zero.in", "0\n")]);

    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();
    let batch = runner.run_all(&inputs).unwrap();

    match &batch.outcomes[0].result {
        Err(RunnerError::Runtime { source, .. }) => {
            assert_eq!(source.exception_kind(), Some("ZeroDivisionError"));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_expression_lines_can_exceed_hundred_percent() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "print(input_value)\nprint(2)\nx = 1\n");
    let input = dir.path().join("one.in");
    fs::write(&input, "7").unwrap();

    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();
    let report = runner.run_input(&input).unwrap();

    assert_eq!(runner.total_statements(), 1);
    assert_eq!(report.covered_lines(), 3);
    assert_eq!(report.summary(), "Statement Coverage: 300.00%");
    assert_eq!(report.output, vec!["7", "2"]);
}

#[test]
fn test_zero_statements_reports_zero_percent() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "'''Only a docstring.'''\nprint('hi')\n");
    let input = dir.path().join("one.in");
    fs::write(&input, "1\n").unwrap();

    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();
    let report = runner.run_input(&input).unwrap();

    assert_eq!(runner.total_statements(), 0);
    assert!(report.covered_lines() > 0);
    assert_eq!(report.summary(), "Statement Coverage: 0.00%");
}

#[test]
fn test_custom_input_name() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "print(n * 2)\n");
    let input = dir.path().join("value.in");
    fs::write(&input, "21\n").unwrap();

    let config = RunnerConfig {
        input_name: "n".to_string(),
        ..RunnerConfig::default()
    };
    let runner = Runner::load(&script, config).unwrap();
    assert_eq!(runner.run_input(&input).unwrap().output, vec!["42"]);
}

#[test]
fn test_listing_marks_executed_lines() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), FACTORIAL_SCRIPT);
    let input = dir.path().join("neg.in");
    fs::write(&input, "-1\n").unwrap();

    let config = RunnerConfig {
        listing: true,
        ..RunnerConfig::default()
    };
    let runner = Runner::load(&script, config).unwrap();
    let report = runner.run_input(&input).unwrap();
    let listing = report.listing.expect("listing requested");

    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 17);
    assert_eq!(lines[0], "   1  def factorial(n):");
    assert_eq!(lines[5], "|  6      if n < 0:");
    assert_eq!(lines[6], "|  7          return None");
    assert_eq!(lines[8], "   9          i = 1");
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = Runner::load(dir.path().join("missing.py"), RunnerConfig::default());
    assert!(matches!(missing, Err(RunnerError::Io { .. })));

    let broken = write_script(dir.path(), "def f(:\n    pass\n");
    let parsed = Runner::load(&broken, RunnerConfig::default());
    assert!(matches!(parsed, Err(RunnerError::Parse { .. })));
}

#[test]
fn test_statement_count_comes_from_the_loaded_script() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), FACTORIAL_SCRIPT);
    let runner = Runner::load(&script, RunnerConfig::default()).unwrap();

    // Later edits to the file do not change a loaded runner
    fs::write(&script, "x = 1\n").unwrap();
    assert_eq!(runner.total_statements(), count_source(FACTORIAL_SCRIPT).unwrap());
    assert_eq!(total_statements(&script).unwrap(), 1);
}
