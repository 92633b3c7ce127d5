use std::io::{self, BufRead, IsTerminal, Write};

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::completion::ShellCompleter;
use crate::config::SearchPath;
use crate::error::ShellResult;

pub const PROMPT: &str = "$ ";
pub const CONTINUATION_PROMPT: &str = "> ";

/// True when a physical line ends in an odd number of backslashes, i.e. the
/// last one escapes the newline.
pub fn needs_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Reads one logical line, prompting for continuation lines as needed.
/// Continuation lines are joined with `\n`.
pub fn read_logical_line<F>(mut read: F) -> Result<String, ReadlineError>
where
    F: FnMut(&str) -> Result<String, ReadlineError>,
{
    let mut input = read(PROMPT)?;
    while needs_continuation(&input) {
        match read(CONTINUATION_PROMPT) {
            Ok(next) => {
                input.push('\n');
                input.push_str(&next);
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(input)
}

/// Source of physical lines: a line editor on a terminal, plain buffered
/// reads otherwise.
pub enum LineReader {
    Interactive(Box<Editor<ShellCompleter, DefaultHistory>>),
    Piped(io::Stdin),
}

impl LineReader {
    pub fn new(search_path: SearchPath) -> ShellResult<Self> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            tracing::debug!("stdin is not a terminal, reading plain lines");
            return Ok(Self::Piped(stdin));
        }
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ShellCompleter::new(search_path)));
        Ok(Self::Interactive(Box::new(editor)))
    }

    /// Reads the next logical line. `Eof` ends the session.
    pub fn next_line(&mut self) -> Result<String, ReadlineError> {
        let line = read_logical_line(|prompt| self.read_physical(prompt))?;
        if let Self::Interactive(editor) = self
            && !line.trim().is_empty()
        {
            editor.add_history_entry(line.as_str())?;
        }
        Ok(line)
    }

    fn read_physical(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        match self {
            Self::Interactive(editor) => editor.readline(prompt),
            Self::Piped(stdin) => {
                let mut stdout = io::stdout();
                stdout.write_all(prompt.as_bytes())?;
                stdout.flush()?;

                read_plain_line(&mut stdin.lock())
            }
        }
    }
}

/// Reads one line without its terminator. Bytes that are not UTF-8 are
/// replaced rather than rejected.
fn read_plain_line(reader: &mut impl BufRead) -> Result<String, ReadlineError> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Err(ReadlineError::Eof);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn feed(lines: &[&str]) -> (Result<String, ReadlineError>, Vec<String>) {
        let mut queue: VecDeque<String> = lines.iter().map(|l| l.to_string()).collect();
        let mut prompts = Vec::new();
        let result = read_logical_line(|prompt| {
            prompts.push(prompt.to_string());
            queue.pop_front().ok_or(ReadlineError::Eof)
        });
        (result, prompts)
    }

    #[test]
    fn test_needs_continuation() {
        assert!(needs_continuation(r"echo a\"));
        assert!(!needs_continuation(r"echo a\\"));
        assert!(needs_continuation(r"echo a\\\"));
        assert!(!needs_continuation("echo a"));
        assert!(!needs_continuation(""));
    }

    #[test]
    fn test_single_line() {
        let (line, prompts) = feed(&["echo hi", "unused"]);
        assert_eq!(line.unwrap(), "echo hi");
        assert_eq!(prompts, vec!["$ "]);
    }

    #[test]
    fn test_continuation_joins_with_newline() {
        let (line, prompts) = feed(&[r"echo a\", r"b\", "c"]);
        assert_eq!(line.unwrap(), "echo a\\\nb\\\nc");
        assert_eq!(prompts, vec!["$ ", "> ", "> "]);
    }

    #[test]
    fn test_eof_during_continuation_keeps_input() {
        let (line, _) = feed(&[r"echo a\"]);
        assert_eq!(line.unwrap(), r"echo a\");
    }

    #[test]
    fn test_plain_lines_strip_terminators() {
        let mut reader = io::Cursor::new(b"one\r\ntwo\nthree".to_vec());
        assert_eq!(read_plain_line(&mut reader).unwrap(), "one");
        assert_eq!(read_plain_line(&mut reader).unwrap(), "two");
        assert_eq!(read_plain_line(&mut reader).unwrap(), "three");
        assert!(matches!(read_plain_line(&mut reader), Err(ReadlineError::Eof)));
    }

    #[test]
    fn test_plain_lines_replace_invalid_utf8() {
        let mut reader = io::Cursor::new(b"echo \xff\necho ok\n".to_vec());
        assert_eq!(read_plain_line(&mut reader).unwrap(), "echo \u{FFFD}");
        assert_eq!(read_plain_line(&mut reader).unwrap(), "echo ok");
    }

    #[test]
    fn test_eof_at_prompt() {
        let (line, _) = feed(&[]);
        assert!(matches!(line, Err(ReadlineError::Eof)));
    }
}
