use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use crate::error::{ShellError, ShellResult};

/// Standard stream a redirection replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn fd(self) -> RawFd {
        match self {
            Stream::Stdout => libc::STDOUT_FILENO,
            Stream::Stderr => libc::STDERR_FILENO,
        }
    }

    fn flush(self) {
        let _ = match self {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        };
    }
}

/// Represents a redirection operator and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub file: String,
    pub append: bool,
    pub stream: Stream,
}

/// Splits a raw line into its command text and optional redirection.
///
/// The first `>` in the line starts the redirection, whether or not it sits
/// inside quotes. A `1` or `2` right before it picks the stream and is
/// removed from the command text; `>>` appends. The rest of the line, minus
/// surrounding spaces and tabs, is the target file.
pub fn split_redirection(line: &str) -> (&str, Option<Redirection>) {
    let Some(pos) = line.find('>') else {
        return (line, None);
    };

    let before = &line[..pos];
    let (command, stream) = match before.as_bytes().last() {
        Some(b'1') => (&before[..pos - 1], Stream::Stdout),
        Some(b'2') => (&before[..pos - 1], Stream::Stderr),
        _ => (before, Stream::Stdout),
    };

    let rest = &line[pos + 1..];
    let (rest, append) = match rest.strip_prefix('>') {
        Some(rest) => (rest, true),
        None => (rest, false),
    };
    let file = rest.trim_matches(|c| c == ' ' || c == '\t').to_string();

    (
        command,
        Some(Redirection {
            file,
            append,
            stream,
        }),
    )
}

/// Opens a redirection target, creating it with mode 0644 if needed.
pub fn open_target(redirection: &Redirection) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).mode(0o644);
    if redirection.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(&redirection.file)
}

/// Keeps a standard stream pointed at a file until dropped.
///
/// Dropping the guard flushes pending output, puts the original descriptor
/// back and closes the saved copy.
#[derive(Debug)]
pub struct RedirectGuard {
    stream: Stream,
    saved: OwnedFd,
}

impl RedirectGuard {
    pub fn apply(redirection: &Redirection) -> ShellResult<Self> {
        let to_error = |source| ShellError::Redirect {
            path: redirection.file.clone(),
            source,
        };

        let file = open_target(redirection).map_err(to_error)?;
        let stream = redirection.stream;
        stream.flush();

        let saved = unsafe { libc::dup(stream.fd()) };
        if saved == -1 {
            return Err(to_error(io::Error::last_os_error()));
        }
        // SAFETY: `dup` just returned a fresh descriptor nobody else owns.
        let saved = unsafe { OwnedFd::from_raw_fd(saved) };

        if unsafe { libc::dup2(file.as_raw_fd(), stream.fd()) } == -1 {
            return Err(to_error(io::Error::last_os_error()));
        }

        tracing::debug!(?redirection, "stream redirected");
        Ok(Self { stream, saved })
    }
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        self.stream.flush();
        if unsafe { libc::dup2(self.saved.as_raw_fd(), self.stream.fd()) } == -1 {
            tracing::warn!(
                stream = ?self.stream,
                error = %io::Error::last_os_error(),
                "failed to restore stream"
            );
        } else {
            tracing::trace!(stream = ?self.stream, "stream restored");
        }
    }
}
