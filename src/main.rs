mod commands;
mod completion;
mod config;
mod dispatch;
mod error;
mod input;
mod launcher;
mod redirection;
mod tokenize;

use std::io;

use anyhow::Context;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use crate::config::ShellConfig;
use crate::dispatch::{Flow, Shell};
use crate::input::LineReader;

fn init_logging() {
    let filter = EnvFilter::try_from_env("MINISH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = ShellConfig::from_env();
    let mut reader =
        LineReader::new(config.search_path.clone()).context("failed to set up line editor")?;
    let mut shell = Shell::new(config);

    loop {
        let line = match reader.next_line() {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                eprintln!("{}", e);
                continue;
            }
        };
        if shell.execute(&line) == Flow::Exit {
            break;
        }
    }
    tracing::debug!("session ended");
    Ok(())
}
