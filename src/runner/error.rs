//! Errors raised while loading a script or running it against one input

use crate::interpreter::RuntimeError;
use crate::parser::ParseError;
use crate::trace::TracerError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The first line of an input file is not a base-10 integer
    #[error("{}: expected an integer on the first line, found {line:?}", path.display())]
    MalformedInput { path: PathBuf, line: String },

    #[error("{}: {source}", path.display())]
    Runtime {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error(transparent)]
    Tracer(#[from] TracerError),
}

impl RunnerError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| RunnerError::Io { path, source }
    }
}
