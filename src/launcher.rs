use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

/// Runs an external program and blocks until it finishes.
pub trait Launcher {
    /// `argv[0]` is passed to the child as its own name; `program` is the
    /// resolved image to execute.
    fn launch(&mut self, program: &Path, argv: &[String]) -> io::Result<()>;
}

/// Spawns real child processes that inherit the shell's standard streams.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, program: &Path, argv: &[String]) -> io::Result<()> {
        let mut command = Command::new(program);
        if let Some((name, args)) = argv.split_first() {
            command.arg0(name).args(args);
        }
        let status = command.spawn()?.wait()?;
        tracing::debug!(program = %program.display(), %status, "child exited");
        Ok(())
    }
}
