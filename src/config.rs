use std::env;
use std::path::{Path, PathBuf};

/// Ordered list of directories searched for external commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Parses a colon-delimited `PATH` value. Empty entries are dropped, so
    /// the current directory is only searched when `.` is listed.
    pub fn parse(value: &str) -> Self {
        let dirs = value
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Finds the first executable regular file named exactly `command`.
    pub fn find(&self, command: &str) -> Option<PathBuf> {
        if command.is_empty() || command.contains('/') {
            return None;
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(command))
            .find(|full| is_executable(full))
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|m| {
        m.is_file() && {
            #[cfg(unix)]
            {
                m.permissions().mode() & 0o111 != 0
            }
            #[cfg(not(unix))]
            {
                true
            }
        }
    })
}

/// Values the shell takes from its environment at startup.
#[derive(Debug, Clone, Default)]
pub struct ShellConfig {
    pub search_path: SearchPath,
    pub home: Option<PathBuf>,
}

impl ShellConfig {
    pub fn new(search_path: SearchPath, home: Option<PathBuf>) -> Self {
        Self { search_path, home }
    }

    /// Reads `PATH` and `HOME`.
    pub fn from_env() -> Self {
        let search_path = env::var("PATH")
            .map(|p| SearchPath::parse(&p))
            .unwrap_or_default();
        let home = env::var_os("HOME").map(PathBuf::from);
        tracing::debug!(dirs = search_path.dirs.len(), ?home, "loaded config");
        Self::new(search_path, home)
    }
}
