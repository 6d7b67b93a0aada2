use super::{Command, CommandError, Outcome};

#[derive(Clone, Default)]
pub struct ExitCommand;

impl ExitCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ExitCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        match args {
            [] => Ok(Outcome::Exit(0)),
            [code] => code.parse::<i32>().map(Outcome::Exit).map_err(|_| {
                CommandError::InvalidArguments(format!("exit: {}: numeric argument required", code))
            }),
            _ => Err(CommandError::InvalidArguments(
                "exit: too many arguments".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let cmd = ExitCommand::new();
        assert_eq!(cmd.execute(&[]).unwrap(), Outcome::Exit(0));
        assert_eq!(cmd.execute(&["3".to_string()]).unwrap(), Outcome::Exit(3));
    }

    #[test]
    fn test_exit_rejects_garbage() {
        let cmd = ExitCommand::new();
        assert!(cmd.execute(&["soon".to_string()]).is_err());
        assert!(cmd.execute(&["1".to_string(), "2".to_string()]).is_err());
    }
}
