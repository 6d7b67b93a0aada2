use super::{Command, CommandError, Outcome};
use crate::path::PathExpander;
use std::env;

#[derive(Clone)]
pub struct CdCommand {
    path_expander: PathExpander,
}

impl Default for CdCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CdCommand {
    pub fn new() -> Self {
        Self {
            path_expander: PathExpander::new(),
        }
    }

    #[cfg(test)]
    fn with_expander(path_expander: PathExpander) -> Self {
        Self { path_expander }
    }
}

impl Command for CdCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        if args.len() > 1 {
            return Err(CommandError::InvalidArguments(
                "cd: too many arguments".to_string(),
            ));
        }

        let path_str = args.first().map(|s| s.as_str()).unwrap_or("~");
        let expanded_path = self
            .path_expander
            .expand(path_str)
            .map_err(|e| CommandError::ExecutionError(format!("cd: {}", e)))?;

        env::set_current_dir(&expanded_path).map_err(|e| {
            CommandError::ExecutionError(format!("cd: {}: {}", path_str, e))
        })?;
        Ok(Outcome::Status(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The working directory is process-wide.
    static CWD_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_cd_home_and_back() {
        let _guard = CWD_LOCK.lock().unwrap();
        let original = env::current_dir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let home_path = home.path().canonicalize().unwrap();

        let cmd = CdCommand::with_expander(PathExpander::with_home(&home_path));
        assert_eq!(cmd.execute(&[]).unwrap(), Outcome::Status(0));
        assert_eq!(env::current_dir().unwrap(), home_path);

        env::set_current_dir(original).unwrap();
    }

    #[test]
    fn test_cd_invalid() {
        let _guard = CWD_LOCK.lock().unwrap();
        let cmd = CdCommand::new();
        let err = cmd
            .execute(&["/nonexistent/atrium/path".to_string()])
            .unwrap_err();
        assert!(err.to_string().starts_with("cd: /nonexistent/atrium/path: "));
    }

    #[test]
    fn test_cd_too_many_arguments() {
        let cmd = CdCommand::new();
        let result = cmd.execute(&["/tmp".to_string(), "/".to_string()]);
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }
}
