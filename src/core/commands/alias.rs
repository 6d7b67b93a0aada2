use super::{Command, CommandError, Outcome};
use crate::core::config::AliasManager;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AliasCommand {
    aliases: Arc<Mutex<AliasManager>>,
}

impl AliasCommand {
    pub fn new(aliases: Arc<Mutex<AliasManager>>) -> Self {
        Self { aliases }
    }
}

impl Command for AliasCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        let mut aliases = self.aliases.lock().map_err(|e| {
            CommandError::ExecutionError(format!("Failed to access aliases: {}", e))
        })?;

        if args.is_empty() {
            for (alias, command) in aliases.get_all() {
                println!("alias {}='{}'", alias, command);
            }
            return Ok(Outcome::Status(0));
        }

        let alias_str = args.join(" ");
        let Some((name, value)) = alias_str.split_once('=') else {
            return match aliases.get(alias_str.trim()) {
                Some(command) => {
                    println!("alias {}='{}'", alias_str.trim(), command);
                    Ok(Outcome::Status(0))
                }
                None => Err(CommandError::InvalidArguments(format!(
                    "alias: {}: not found",
                    alias_str.trim()
                ))),
            };
        };

        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(CommandError::InvalidArguments(
                "alias: usage: alias name='command'".to_string(),
            ));
        }
        let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
        aliases.add(name, value);
        Ok(Outcome::Status(0))
    }
}
