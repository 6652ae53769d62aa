//! Batch coverage runner
//!
//! A [`Runner`] parses a script once, then runs it once per input file:
//! - [`discover_inputs`]: the input files under a path, sorted
//! - [`read_input_value`]: the integer on an input file's first line
//! - [`Runner::run_input`]: a fresh interpreter with the value bound as a
//!   global, executed inside a [`Tracer`] scope
//!
//! Runs never share interpreter state, so the same input always produces the
//! same coverage.

pub mod error;
pub mod report;

use crate::analysis::{count_statements, FunctionRegistry};
use crate::interpreter::{ExecConfig, Interpreter};
use crate::memory::value::Value;
use crate::parser::ast::{Module, Node};
use crate::parser::parse_module;
use crate::trace::Tracer;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

pub use error::RunnerError;
pub use report::{BatchReport, InputOutcome, RunReport};

/// Default extension of input files inside an input directory
pub const DEFAULT_EXTENSION: &str = "in";

/// Default global name the input value is bound to
pub const DEFAULT_INPUT_NAME: &str = "input_value";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Extension (without the dot) selecting input files in a directory
    pub extension: String,
    /// Global name the input value is bound to
    pub input_name: String,
    pub exec: ExecConfig,
    /// Render an annotated listing into each report
    pub listing: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            extension: DEFAULT_EXTENSION.to_string(),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            exec: ExecConfig::default(),
            listing: false,
        }
    }
}

/// Input files selected by `path`.
///
/// A file is returned as is. A directory is listed without recursion for
/// regular files with extension `extension`, sorted by path.
pub fn discover_inputs(path: &Path, extension: &str) -> Result<Vec<PathBuf>, RunnerError> {
    let metadata = fs::metadata(path).map_err(RunnerError::io(path))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(path).map_err(RunnerError::io(path))? {
        let entry = entry.map_err(RunnerError::io(path))?;
        let candidate = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden
            && candidate.is_file()
            && candidate.extension().is_some_and(|ext| ext == extension)
        {
            inputs.push(candidate);
        }
    }
    inputs.sort();

    debug!(dir = %path.display(), count = inputs.len(), "discovered inputs");
    Ok(inputs)
}

/// Parse the first line of `path` as a base-10 integer
pub fn read_input_value(path: &Path) -> Result<i64, RunnerError> {
    let text = fs::read_to_string(path).map_err(RunnerError::io(path))?;
    let first = text.lines().next().unwrap_or("").trim();
    first.parse().map_err(|_| RunnerError::MalformedInput {
        path: path.to_path_buf(),
        line: first.to_string(),
    })
}

/// A parsed script ready to be run against inputs
#[derive(Debug)]
pub struct Runner {
    script_path: PathBuf,
    source: String,
    module: Rc<Module>,
    total_statements: usize,
    registry: FunctionRegistry,
    config: RunnerConfig,
}

impl Runner {
    /// Read, parse and count the statements of the script at `script_path`
    pub fn load(
        script_path: impl Into<PathBuf>,
        config: RunnerConfig,
    ) -> Result<Self, RunnerError> {
        let script_path = script_path.into();
        let source = fs::read_to_string(&script_path).map_err(RunnerError::io(&script_path))?;
        let module = parse_module(&source).map_err(|source| RunnerError::Parse {
            path: script_path.clone(),
            source,
        })?;
        let total_statements = count_statements(Node::Module(&module));
        let registry = FunctionRegistry::from_module(&module);

        info!(
            script = %script_path.display(),
            total_statements,
            definitions = registry.len(),
            "loaded script"
        );
        Ok(Runner {
            script_path,
            source,
            module: Rc::new(module),
            total_statements,
            registry,
            config,
        })
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn total_statements(&self) -> usize {
        self.total_statements
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Read the value in `input` and run the script with it
    pub fn run_input(&self, input: &Path) -> Result<RunReport, RunnerError> {
        let value = read_input_value(input)?;
        self.run_value(input, value)
    }

    /// Run the script once with `value` bound to the input name
    pub fn run_value(&self, input: &Path, value: i64) -> Result<RunReport, RunnerError> {
        let mut interp = Interpreter::with_config(Rc::clone(&self.module), self.config.exec);
        interp.bind(&self.config.input_name, Value::Int(value));

        let tracer = Tracer::new();
        let outcome = {
            let mut scope = tracer.enter(&mut interp)?;
            scope.run()
        };
        outcome.map_err(|source| RunnerError::Runtime {
            path: input.to_path_buf(),
            source,
        })?;

        let coverage = tracer.coverage();
        debug!(
            input = %input.display(),
            value,
            events = tracer.log().len(),
            covered = coverage.len(),
            "traced run finished"
        );

        let listing = self
            .config
            .listing
            .then(|| tracer.render_listing(&self.registry, &self.source));
        Ok(RunReport {
            input: input.to_path_buf(),
            input_value: value,
            coverage,
            output: interp.output().get_output(),
            total_statements: self.total_statements,
            listing,
        })
    }

    /// Run every input selected by `path`.
    ///
    /// Only discovery failures abort the batch; a failing input is recorded
    /// and the remaining inputs still run.
    pub fn run_all(&self, path: &Path) -> Result<BatchReport, RunnerError> {
        let mut batch = BatchReport::default();
        for input in discover_inputs(path, &self.config.extension)? {
            let result = self.run_input(&input);
            if let Err(err) = &result {
                warn!(input = %input.display(), "run failed: {}", err);
            }
            batch.push(input, result);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        for name in ["b.in", "a.in", "notes.txt", ".hidden.in"] {
            fs::write(dir.path().join(name), "1\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.in")).unwrap();

        let inputs = discover_inputs(dir.path(), "in").unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.in", "b.in"]);
    }

    #[test]
    fn test_single_file_is_its_own_input() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("value.txt");
        fs::write(&file, "7\n").unwrap();
        assert_eq!(discover_inputs(&file, "in").unwrap(), vec![file]);
    }

    #[test]
    fn test_missing_input_path() {
        let dir = TempDir::new().unwrap();
        let err = discover_inputs(&dir.path().join("absent"), "in").unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }

    #[test]
    fn test_read_input_value() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.in");
        fs::write(&good, "  -12  \nignored\n").unwrap();
        assert_eq!(read_input_value(&good).unwrap(), -12);

        let bad = dir.path().join("bad.in");
        fs::write(&bad, "twelve\n").unwrap();
        match read_input_value(&bad) {
            Err(RunnerError::MalformedInput { line, .. }) => assert_eq!(line, "twelve"),
            other => panic!("expected malformed input, got {:?}", other),
        }
    }
}
