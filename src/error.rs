use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

/// Errors surfaced while processing a line. None of them end the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;
