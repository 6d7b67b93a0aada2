use super::{Command, CommandError, Outcome};
use crate::core::env::{split_assignment, EnvVarManager};
use std::sync::{Arc, Mutex};

/// `export NAME=VALUE...` marks variables for every launched process.
/// A bare `NAME` promotes an existing shell variable.
#[derive(Clone)]
pub struct ExportCommand {
    env_vars: Arc<Mutex<EnvVarManager>>,
}

impl ExportCommand {
    pub fn new(env_vars: Arc<Mutex<EnvVarManager>>) -> Self {
        Self { env_vars }
    }
}

impl Command for ExportCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        let mut env_vars = self.env_vars.lock().map_err(|_| {
            CommandError::ExecutionError("Failed to lock environment variables".into())
        })?;

        if args.is_empty() {
            for (name, value) in env_vars.exported() {
                println!("export {}={}", name, shlex::try_quote(value).unwrap_or_default());
            }
            return Ok(Outcome::Status(0));
        }

        for arg in args {
            let (name, value) = match split_assignment(arg) {
                Some((name, value)) => (name.to_string(), value.to_string()),
                None => {
                    let value = env_vars.lookup(arg).ok_or_else(|| {
                        CommandError::InvalidArguments(format!("export: {}: no value to export", arg))
                    })?;
                    (arg.clone(), value)
                }
            };

            env_vars
                .export(&name, &value)
                .map_err(|e| CommandError::InvalidArguments(format!("export: {}", e)))?;
        }

        Ok(Outcome::Status(0))
    }
}
