use std::{
    collections::BTreeSet,
    env,
    fs,
};

use rustyline::completion::Pair;

use crate::core::commands::BUILTINS;

/// Completes command names: builtins, aliases and executables on `PATH`.
#[derive(Clone, Default)]
pub struct CommandCompleter {
    commands: BTreeSet<String>,
    aliases: BTreeSet<String>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        let mut completer = Self::default();
        completer.refresh_commands();
        completer
    }

    pub fn refresh_commands(&mut self) {
        self.commands.clear();
        self.commands
            .extend(BUILTINS.iter().map(|name| name.to_string()));
        self.add_path_commands();
    }

    fn add_path_commands(&mut self) {
        let Some(path_var) = env::var_os("PATH") else {
            return;
        };
        for dir in env::split_paths(&path_var) {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.filter_map(Result::ok) {
                let is_file = entry
                    .file_type()
                    .map(|t| t.is_file() || t.is_symlink())
                    .unwrap_or(false);
                if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                    self.commands.insert(name.to_string());
                }
            }
        }
    }

    pub fn update_aliases(&mut self, names: Vec<String>) {
        self.aliases = names.into_iter().collect();
    }

    pub fn complete_command(&self, word: &str) -> Vec<Pair> {
        let commands = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(word))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            });
        let aliases = self
            .aliases
            .iter()
            .filter(|alias| alias.starts_with(word))
            .map(|alias| Pair {
                display: format!("{} (alias)", alias),
                replacement: format!("{} ", alias),
            });
        commands.chain(aliases).collect()
    }
}
