use std::borrow::Cow;

use super::{command::CommandCompleter, path::PathCompleter};
use crate::highlight::SyntaxHighlighter;

use rustyline::{
    completion::{Completer, Pair},
    highlight::{CmdKind, Highlighter},
    hint::{Hinter, HistoryHinter},
    validate::Validator,
    Context, Helper,
};

/// The line editor helper: completion, history hints and highlighting.
pub struct ShellCompleter {
    command_completer: CommandCompleter,
    path_completer: PathCompleter,
    highlighter: SyntaxHighlighter,
    hinter: HistoryHinter,
}

impl Default for ShellCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellCompleter {
    pub fn new() -> Self {
        ShellCompleter {
            command_completer: CommandCompleter::new(),
            path_completer: PathCompleter::new(),
            highlighter: SyntaxHighlighter::new(),
            hinter: HistoryHinter::new(),
        }
    }

    pub fn update_aliases(&mut self, names: Vec<String>) {
        self.command_completer.update_aliases(names);
    }
}

/// Byte offset where the word under the cursor starts, and whether it is in
/// command position (first word of the line or of a pipeline stage).
fn current_word(line: &str) -> (usize, bool) {
    let start = line
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace() || c == '|')
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let before = line[..start].trim_end();
    let command_position = before.is_empty() || before.ends_with('|');
    (start, command_position)
}

impl Helper for ShellCompleter {}

impl Highlighter for ShellCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight_command(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(self.highlighter.highlight_hint(hint))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Validator for ShellCompleter {}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_up_to_cursor = &line[..pos];
        let (start, command_position) = current_word(line_up_to_cursor);
        let word = &line_up_to_cursor[start..];

        let matches = if command_position && !word.contains('/') {
            self.command_completer.complete_command(word)
        } else {
            self.path_completer.complete_path(word)
        };

        Ok((start, matches))
    }
}
