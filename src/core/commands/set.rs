use super::{Command, CommandError, Outcome};
use crate::core::env::{split_assignment, EnvVarManager};
use std::sync::{Arc, Mutex};

/// `set NAME=VALUE` defines a shell variable. It is visible to `$NAME`
/// expansion but not to child processes until exported.
#[derive(Clone)]
pub struct SetCommand {
    env_vars: Arc<Mutex<EnvVarManager>>,
}

impl SetCommand {
    pub fn new(env_vars: Arc<Mutex<EnvVarManager>>) -> Self {
        Self { env_vars }
    }
}

impl Command for SetCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        let mut env_vars = self.env_vars.lock().map_err(|_| {
            CommandError::ExecutionError("Failed to lock environment variables".into())
        })?;

        if args.is_empty() {
            for (name, value) in env_vars.variables() {
                println!("{}={}", name, value);
            }
            return Ok(Outcome::Status(0));
        }

        for arg in args {
            let (name, value) = split_assignment(arg).ok_or_else(|| {
                CommandError::InvalidArguments("set: usage: set NAME=VALUE".to_string())
            })?;
            env_vars
                .set_variable(name, value)
                .map_err(|e| CommandError::InvalidArguments(format!("set: {}", e)))?;
        }
        Ok(Outcome::Status(0))
    }
}
