//! Per-input coverage reports

use crate::runner::error::RunnerError;
use crate::trace::{format_coverage, LineHit};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Coverage of one traced run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub input: PathBuf,
    /// Value read from the input file and bound before the run
    pub input_value: i64,
    pub coverage: BTreeSet<LineHit>,
    /// Lines written by `print`
    pub output: Vec<String>,
    pub total_statements: usize,
    /// Annotated listing, when requested
    pub listing: Option<String>,
}

impl RunReport {
    /// Distinct `(function, line)` pairs executed
    pub fn covered_lines(&self) -> usize {
        self.coverage.len()
    }

    /// Covered lines as a percentage of counted statements.
    ///
    /// Lines holding only an expression statement are covered but not
    /// counted, so the result can exceed 100. A script without statements
    /// reports 0.
    pub fn percentage(&self) -> f64 {
        if self.total_statements == 0 {
            return 0.0;
        }
        self.covered_lines() as f64 / self.total_statements as f64 * 100.0
    }

    pub fn coverage_text(&self) -> String {
        format_coverage(&self.coverage)
    }

    pub fn summary(&self) -> String {
        format!("Statement Coverage: {:.2}%", self.percentage())
    }
}

/// Result of running one input file
#[derive(Debug)]
pub struct InputOutcome {
    pub input: PathBuf,
    pub result: Result<RunReport, RunnerError>,
}

/// Results for every input of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<InputOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, input: PathBuf, result: Result<RunReport, RunnerError>) {
        self.outcomes.push(InputOutcome { input, result });
    }

    /// Reports of the inputs that ran to completion
    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(covered: &[(&str, usize)], total_statements: usize) -> RunReport {
        RunReport {
            input: PathBuf::from("1.in"),
            input_value: 1,
            coverage: covered
                .iter()
                .map(|(name, line)| LineHit::new(*name, *line))
                .collect(),
            output: Vec::new(),
            total_statements,
            listing: None,
        }
    }

    #[test]
    fn test_percentage() {
        let r = report(&[("f", 1), ("f", 2), ("<module>", 4)], 4);
        assert_eq!(r.summary(), "Statement Coverage: 75.00%");
    }

    #[test]
    fn test_zero_statements_is_zero_percent() {
        let r = report(&[("<module>", 1)], 0);
        assert_eq!(r.percentage(), 0.0);
        assert_eq!(r.summary(), "Statement Coverage: 0.00%");
    }

    #[test]
    fn test_percentage_can_exceed_hundred() {
        let r = report(&[("<module>", 1), ("<module>", 2)], 1);
        assert_eq!(r.summary(), "Statement Coverage: 200.00%");
    }

    #[test]
    fn test_batch_counts_failures() {
        let mut batch = BatchReport::default();
        batch.push(PathBuf::from("1.in"), Ok(report(&[], 1)));
        batch.push(
            PathBuf::from("2.in"),
            Err(RunnerError::MalformedInput {
                path: PathBuf::from("2.in"),
                line: "x".to_string(),
            }),
        );
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.failures(), 1);
        assert_eq!(batch.reports().count(), 1);
        assert!(!batch.is_success());
    }
}
