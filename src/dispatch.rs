use std::io::{self, Write};

use crate::commands::{Builtin, execute_builtin};
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::launcher::{Launcher, SystemLauncher};
use crate::redirection::{RedirectGuard, split_redirection};
use crate::tokenize::tokenize;

/// What the prompt loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Per-process session: configuration, process launcher and the output
/// streams builtins write to.
pub struct Shell<L = SystemLauncher> {
    config: ShellConfig,
    launcher: L,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Shell<SystemLauncher> {
    pub fn new(config: ShellConfig) -> Self {
        Self::with_io(
            config,
            SystemLauncher,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }
}

impl<L: Launcher> Shell<L> {
    pub fn with_io(config: ShellConfig, launcher: L, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            config,
            launcher,
            out,
            err,
        }
    }

    /// Runs one logical input line.
    pub fn execute(&mut self, line: &str) -> Flow {
        let (command, redirection) = split_redirection(line);
        let tokens = tokenize(command);
        if tokens.is_empty() {
            return Flow::Continue;
        }
        tracing::debug!(?tokens, ?redirection, "dispatching");

        let guard = match redirection.as_ref().map(RedirectGuard::apply).transpose() {
            Ok(guard) => guard,
            Err(e) => {
                self.report(&e);
                return Flow::Continue;
            }
        };

        let flow = match self.run(&tokens) {
            Ok(flow) => flow,
            Err(e) => {
                self.report(&e);
                Flow::Continue
            }
        };

        let _ = self.out.flush();
        let _ = self.err.flush();
        drop(guard);
        flow
    }

    fn run(&mut self, tokens: &[String]) -> Result<Flow, ShellError> {
        let name = &tokens[0];
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(execute_builtin(
                builtin,
                tokens,
                &self.config,
                &mut self.out,
                &mut self.err,
            )?);
        }

        match self.config.search_path.find(name) {
            Some(program) => {
                tracing::debug!(program = %program.display(), "launching");
                self.out.flush()?;
                self.err.flush()?;
                self.launcher
                    .launch(&program, tokens)
                    .map_err(|source| ShellError::Spawn {
                        command: name.clone(),
                        source,
                    })?;
            }
            None => writeln!(self.out, "{}: command not found", name)?,
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, error: &ShellError) {
        let _ = writeln!(self.err, "{}", error);
        let _ = self.err.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchPath;
    use std::cell::RefCell;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingLauncher {
        calls: Vec<(PathBuf, Vec<String>)>,
        fail: bool,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&mut self, program: &Path, argv: &[String]) -> io::Result<()> {
            self.calls.push((program.to_path_buf(), argv.to_vec()));
            if self.fail {
                Err(io::Error::from_raw_os_error(libc::ENOEXEC))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    struct Fixture {
        shell: Shell<RecordingLauncher>,
        out: Captured,
        err: Captured,
        bin: tempfile::TempDir,
    }

    fn fixture(fail: bool) -> Fixture {
        let bin = tempfile::tempdir().unwrap();
        let tool = bin.path().join("tool");
        fs::write(&tool, "").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let config = ShellConfig::new(SearchPath::parse(&bin.path().display().to_string()), None);
        let out = Captured::default();
        let err = Captured::default();
        let launcher = RecordingLauncher {
            fail,
            ..Default::default()
        };
        let shell = Shell::with_io(config, launcher, Box::new(out.clone()), Box::new(err.clone()));
        Fixture {
            shell,
            out,
            err,
            bin,
        }
    }

    #[test]
    fn test_blank_line_is_noop() {
        let mut f = fixture(false);
        assert_eq!(f.shell.execute("   "), Flow::Continue);
        assert!(f.out.text().is_empty() && f.err.text().is_empty());
    }

    #[test]
    fn test_empty_command_skips_redirection() {
        let mut f = fixture(false);
        let target = f.bin.path().join("never.txt");
        f.shell.execute(&format!("  > {}", target.display()));
        assert!(!target.exists());
    }

    #[test]
    fn test_echo_with_quotes() {
        let mut f = fixture(false);
        f.shell.execute(r#"echo 'a b' "c d""#);
        f.shell.execute(r"echo hello\ world");
        f.shell.execute(r#"echo foo'bar'"baz""#);
        assert_eq!(f.out.text(), "a b c d\nhello world\nfoobarbaz\n");
    }

    #[test]
    fn test_unknown_command() {
        let mut f = fixture(false);
        assert_eq!(f.shell.execute("nope arg"), Flow::Continue);
        assert_eq!(f.out.text(), "nope: command not found\n");
        assert!(f.shell.launcher.calls.is_empty());
    }

    #[test]
    fn test_external_command_resolves_on_path() {
        let mut f = fixture(false);
        f.shell.execute("tool 'one two' three");
        let expected = f.bin.path().join("tool");
        assert_eq!(
            f.shell.launcher.calls,
            vec![(
                expected,
                vec!["tool".to_string(), "one two".to_string(), "three".to_string()]
            )]
        );
    }

    #[test]
    fn test_builtins_are_never_launched() {
        let mut f = fixture(false);
        f.shell.execute("type echo");
        f.shell.execute("echo tool");
        assert!(f.shell.launcher.calls.is_empty());
        assert_eq!(f.out.text(), "echo is a shell builtin\ntool\n");
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut f = fixture(true);
        assert_eq!(f.shell.execute("tool"), Flow::Continue);
        assert!(f.err.text().starts_with("tool: "));
    }

    #[test]
    fn test_exit_transitions() {
        let mut f = fixture(false);
        assert_eq!(f.shell.execute("exit 1"), Flow::Continue);
        assert_eq!(f.err.text(), "Usage: exit [0]\n");
        assert_eq!(f.shell.execute("exit 0"), Flow::Exit);
        assert_eq!(f.shell.execute("exit"), Flow::Exit);
    }

    #[test]
    fn test_redirect_open_failure_abandons_line() {
        let mut f = fixture(false);
        let flow = f.shell.execute("tool 2> /no/such/dir/err.txt");
        assert_eq!(flow, Flow::Continue);
        assert!(f.shell.launcher.calls.is_empty());
        assert!(f.err.text().starts_with("/no/such/dir/err.txt: "));
    }

    #[test]
    fn test_pwd_is_stable() {
        let mut f = fixture(false);
        f.shell.execute("pwd");
        f.shell.execute("pwd");
        let text = f.out.text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }
}
