mod file_ops;

use std::{collections::VecDeque, fmt, io, path::PathBuf};

use self::file_ops::FileOps;

pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug)]
pub enum HistoryError {
    Io(io::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Io(e) => write!(f, "history file error: {}", e),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<io::Error> for HistoryError {
    fn from(err: io::Error) -> Self {
        HistoryError::Io(err)
    }
}

/// Accepted command lines, oldest first, capped at `max_entries`.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    file_ops: FileOps,
    max_entries: usize,
}

impl History {
    pub fn new(history_file: PathBuf, max_entries: usize) -> Result<Self, HistoryError> {
        let file_ops = FileOps::new(history_file);
        let mut history = History {
            entries: file_ops.load_entries()?.into(),
            file_ops,
            max_entries,
        };
        history.trim_entries();
        Ok(history)
    }

    pub fn add(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }
        self.entries.push_back(entry.to_owned());
        self.trim_entries();
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The last `count` entries paired with their 1-based position.
    pub fn recent(&self, count: usize) -> Vec<(usize, &str)> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, entry)| (i + 1, entry.as_str()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the history file with the in-memory entries.
    pub fn save(&self) -> Result<(), HistoryError> {
        self.file_ops.write_entries(&self.entries)?;
        Ok(())
    }

    fn trim_entries(&mut self) {
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_cap_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::new(dir.path().join("hist"), 3).unwrap();
        for line in ["a", "b", "c", "d"] {
            history.add(line);
        }
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::new(dir.path().join("hist"), 10).unwrap();
        history.add("   ");
        assert!(history.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hist");

        let mut history = History::new(path.clone(), 10).unwrap();
        history.add("ls -la");
        history.add("echo hi | cat");
        history.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ls -la\necho hi | cat\n");
        let reloaded = History::new(path, 10).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_load_respects_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        fs::write(&path, "1\n2\n\n3\n4\n").unwrap();

        let history = History::new(path, 2).unwrap();
        assert_eq!(history.entries().collect::<Vec<_>>(), vec!["3", "4"]);
    }

    #[test]
    fn test_recent_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::new(dir.path().join("hist"), 10).unwrap();
        for line in ["a", "b", "c"] {
            history.add(line);
        }
        assert_eq!(history.recent(2), vec![(2, "b"), (3, "c")]);
        assert_eq!(history.recent(10).len(), 3);
    }
}
