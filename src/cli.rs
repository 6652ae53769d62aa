//! CLI definitions and argument types.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use linecov::interpreter::{ExecConfig, DEFAULT_MAX_DEPTH};
use linecov::runner::{RunnerConfig, DEFAULT_EXTENSION, DEFAULT_INPUT_NAME};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "linecov")]
#[command(about = "Statement coverage of a script, one traced run per input file")]
#[command(version)]
pub struct Cli {
    /// Script to measure
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Input file, or a directory of input files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Extension of the input files read from a directory
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub ext: String,

    /// Global name the input value is bound to
    #[arg(long, default_value = DEFAULT_INPUT_NAME)]
    pub input_name: String,

    /// Do not print the script before each run
    #[arg(long)]
    pub no_echo: bool,

    /// Print each covered function with executed lines marked
    #[arg(long)]
    pub listing: bool,

    /// Browse the results in a terminal UI after the batch
    #[arg(long)]
    pub tui: bool,

    /// Abort a run that takes longer than this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum call depth before RecursionError
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Log at debug level when `RUST_LOG` is unset
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,
}

impl Cli {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            extension: self.ext.clone(),
            input_name: self.input_name.clone(),
            exec: ExecConfig {
                deadline: self.timeout_ms.map(Duration::from_millis),
                max_depth: self.max_depth,
            },
            listing: self.listing,
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "linecov=debug"
        } else if self.silent {
            "linecov=error"
        } else {
            "linecov=warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["linecov", "script.py", "inputs"]);
        let config = cli.runner_config();
        assert_eq!(config.extension, "in");
        assert_eq!(config.input_name, "input_value");
        assert_eq!(config.exec.deadline, None);
        assert_eq!(config.exec.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(cli.log_directive(), "linecov=warn");
    }

    #[test]
    fn test_verbose_conflicts_with_silent() {
        assert!(Cli::try_parse_from(["linecov", "s.py", "in", "-v", "-s"]).is_err());
    }

    #[test]
    fn test_timeout() {
        let cli = Cli::parse_from(["linecov", "s.py", "in", "--timeout-ms", "250"]);
        assert_eq!(
            cli.runner_config().exec.deadline,
            Some(Duration::from_millis(250))
        );
    }
}
