use super::{Command, CommandError, Outcome};
use crate::input::History;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct HistoryCommand {
    history: Arc<Mutex<History>>,
}

impl HistoryCommand {
    pub fn new(history: Arc<Mutex<History>>) -> Self {
        Self { history }
    }

    fn show_recent(&self, count: Option<usize>) -> Result<Outcome, CommandError> {
        let history = self
            .history
            .lock()
            .map_err(|_| CommandError::ExecutionError("Failed to lock history".to_string()))?;

        for (index, entry) in history.recent(count.unwrap_or(history.len())) {
            println!("{:>5}: {}", index, entry);
        }
        Ok(Outcome::Status(0))
    }
}

impl Command for HistoryCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        match args.first().map(String::as_str) {
            None => self.show_recent(None),
            Some("-c") | Some("--clear") => {
                let mut history = self.history.lock().map_err(|_| {
                    CommandError::ExecutionError("Failed to lock history".to_string())
                })?;
                history.clear();
                Ok(Outcome::Status(0))
            }
            Some(count) => {
                let count = count.parse::<usize>().map_err(|_| {
                    CommandError::InvalidArguments(format!(
                        "history: {}: numeric argument required",
                        count
                    ))
                })?;
                self.show_recent(Some(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (HistoryCommand, Arc<Mutex<History>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::new(dir.path().join("history"), 100).unwrap();
        history.add("ls");
        history.add("echo hi | cat");
        let history = Arc::new(Mutex::new(history));
        (HistoryCommand::new(Arc::clone(&history)), history, dir)
    }

    #[test]
    fn test_history_show() {
        let (cmd, _, _dir) = setup();
        assert_eq!(cmd.execute(&[]).unwrap(), Outcome::Status(0));
        assert_eq!(cmd.execute(&["1".to_string()]).unwrap(), Outcome::Status(0));
    }

    #[test]
    fn test_history_clear() {
        let (cmd, history, _dir) = setup();
        cmd.execute(&["-c".to_string()]).unwrap();
        assert!(history.lock().unwrap().is_empty());
    }

    #[test]
    fn test_history_bad_count() {
        let (cmd, _, _dir) = setup();
        assert!(matches!(
            cmd.execute(&["lots".to_string()]),
            Err(CommandError::InvalidArguments(_))
        ));
    }
}
