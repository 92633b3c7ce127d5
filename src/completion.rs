use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

use crate::commands::BUILTINS;
use crate::config::SearchPath;

/// Shell completer for tab completion.
pub struct ShellCompleter {
    search_path: SearchPath,
    filename_completer: FilenameCompleter,
}

impl ShellCompleter {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            filename_completer: FilenameCompleter::new(),
        }
    }

    /// Builtins and search-path entries starting with `prefix`, sorted and
    /// without duplicates.
    fn command_candidates(&self, prefix: &str) -> Vec<Pair> {
        let builtins = BUILTINS.iter().map(|b| b.to_string());
        let executables = self
            .search_path
            .dirs()
            .iter()
            .filter_map(|dir| std::fs::read_dir(dir).ok())
            .flat_map(|entries| entries.flatten())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| self.search_path.find(name).is_some());

        let mut names: Vec<String> = builtins
            .chain(executables)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        names.dedup();

        names
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{} ", name),
                display: name,
            })
            .collect()
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        let (start, word) = extract_word(line, pos);
        if is_first_word(line, pos) {
            Ok((start, self.command_candidates(word)))
        } else {
            self.filename_completer.complete(line, pos, ctx)
        }
    }
}

fn is_first_word(line: &str, pos: usize) -> bool {
    let before = &line[..pos];
    match before.split_whitespace().count() {
        0 => true,
        1 => !before.ends_with(char::is_whitespace),
        _ => false,
    }
}

fn extract_word(line: &str, pos: usize) -> (usize, &str) {
    let before = &line[..pos];
    let start = before.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    (start, &line[start..pos])
}

impl Helper for ShellCompleter {}
impl Hinter for ShellCompleter {
    type Hint = String;
}
impl Highlighter for ShellCompleter {}
impl Validator for ShellCompleter {}
