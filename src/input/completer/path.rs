use std::{
    fs,
    path::{Path, PathBuf},
};

use rustyline::completion::Pair;

use crate::path::PathExpander;

/// Completes file names relative to the current directory, `/` or `~`.
#[derive(Clone, Default)]
pub struct PathCompleter {
    expander: PathExpander,
}

impl PathCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete_path(&self, incomplete: &str) -> Vec<Pair> {
        // Split into the directory part as typed and the file-name prefix.
        let (typed_dir, prefix) = match incomplete.rfind('/') {
            Some(idx) => (&incomplete[..=idx], &incomplete[idx + 1..]),
            None => ("", incomplete),
        };

        let search_dir = self.search_dir(typed_dir);
        let Ok(entries) = fs::read_dir(&search_dir) else {
            return Vec::new();
        };

        let mut matches: Vec<Pair> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.starts_with(prefix) || (name.starts_with('.') && !prefix.starts_with('.'))
                {
                    return None;
                }
                Some(completion_pair(typed_dir, &name, &entry.path()))
            })
            .collect();

        matches.sort_by(|a, b| a.display.cmp(&b.display));
        matches
    }

    fn search_dir(&self, typed_dir: &str) -> PathBuf {
        if typed_dir.is_empty() {
            return PathBuf::from(".");
        }
        if self.expander.is_home_path(typed_dir) {
            if let Ok(expanded) = self.expander.expand(typed_dir) {
                return expanded;
            }
        }
        PathBuf::from(typed_dir)
    }
}

fn completion_pair(typed_dir: &str, name: &str, path: &Path) -> Pair {
    let completed = format!("{}{}", typed_dir, name);
    if path.is_dir() {
        Pair {
            display: format!("{}/", name),
            replacement: format!("{}/", completed),
        }
    } else {
        Pair {
            display: name.to_string(),
            replacement: format!("{} ", completed),
        }
    }
}
