use std::env;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use crate::config::ShellConfig;
use crate::dispatch::Flow;

/// List of builtin commands
pub const BUILTINS: &[&str] = &["echo", "type", "exit", "pwd", "cd"];

/// Commands the shell runs itself instead of spawning a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Type,
    Exit,
    Pwd,
    Cd,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "echo" => Some(Self::Echo),
            "type" => Some(Self::Type),
            "exit" => Some(Self::Exit),
            "pwd" => Some(Self::Pwd),
            "cd" => Some(Self::Cd),
            _ => None,
        }
    }
}

/// Executes a builtin command. `args[0]` is the command name.
pub fn execute_builtin(
    builtin: Builtin,
    args: &[String],
    config: &ShellConfig,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<Flow> {
    let rest = args.get(1..).unwrap_or_default();
    match builtin {
        Builtin::Echo => writeln!(out, "{}", rest.join(" "))?,
        Builtin::Type => execute_type(rest, config, out)?,
        Builtin::Pwd => match env::current_dir() {
            Ok(dir) => writeln!(out, "{}", dir.display())?,
            Err(e) => writeln!(err, "pwd: {}", e)?,
        },
        Builtin::Cd => execute_cd(rest.first(), config, out)?,
        Builtin::Exit => return execute_exit(rest, err),
    }
    Ok(Flow::Continue)
}

fn execute_exit(args: &[String], err: &mut dyn Write) -> io::Result<Flow> {
    match args {
        [] => Ok(Flow::Exit),
        [code] if code == "0" => Ok(Flow::Exit),
        _ => {
            writeln!(err, "Usage: exit [0]")?;
            Ok(Flow::Continue)
        }
    }
}

fn execute_type(names: &[String], config: &ShellConfig, out: &mut dyn Write) -> io::Result<()> {
    for name in names {
        if Builtin::from_name(name).is_some() {
            writeln!(out, "{} is a shell builtin", name)?;
        } else {
            match config.search_path.find(name) {
                Some(path) => writeln!(out, "{} is {}", name, path.display())?,
                None => writeln!(out, "{}: not found", name)?,
            }
        }
    }
    Ok(())
}

fn execute_cd(arg: Option<&String>, config: &ShellConfig, out: &mut dyn Write) -> io::Result<()> {
    let target = match arg.map(String::as_str) {
        None | Some("~") => config.home.clone(),
        Some(arg) => match arg.strip_prefix("~/") {
            Some(rest) => config.home.as_ref().map(|home| home.join(rest)),
            None => Some(PathBuf::from(arg)),
        },
    };
    let Some(dir) = target else {
        tracing::debug!("cd: HOME not set");
        return Ok(());
    };

    match env::set_current_dir(&dir) {
        Ok(()) => {
            tracing::debug!(dir = %dir.display(), "changed directory");
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let shown = arg.map_or_else(|| dir.display().to_string(), String::clone);
            writeln!(out, "cd: {}: No such file or directory", shown)?;
        }
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cd failed");
        }
    }
    Ok(())
}
