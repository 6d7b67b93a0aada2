use crate::core::commands::{CommandError, Outcome};
use crate::core::config::AliasManager;
use crate::error::ShellError;
use crate::input::parser::split_env_prefix;
use crate::input::{CommandLine, ParseError};
use crate::process::Stage;

pub(crate) trait CommandHandler {
    fn execute_command(&mut self, command: &str) -> Result<Outcome, ShellError>;
}

impl CommandHandler for super::Shell {
    fn execute_command(&mut self, command: &str) -> Result<Outcome, ShellError> {
        let expanded = self
            .env_vars
            .lock()
            .map_err(|_| lock_error("environment"))?
            .expand(command)
            .into_owned();

        let line = CommandLine::parse(&expanded)?;
        if line.is_empty() {
            return Ok(Outcome::Status(0));
        }
        let background = line.is_background();

        let stages = {
            let aliases = self.aliases.lock().map_err(|_| lock_error("aliases"))?;
            line.into_stages()
                .into_iter()
                .map(|words| self.build_stage(&aliases, words))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(self.executor.execute(stages, background)?)
    }
}

impl super::Shell {
    /// Alias, `NAME=value` prefix and `~` handling for one stage's words.
    fn build_stage(&self, aliases: &AliasManager, words: Vec<String>) -> Result<Stage, ShellError> {
        let (env, words) = split_env_prefix(aliases.expand_words(words));
        let mut words = words
            .iter()
            .map(|word| self.expander.expand_word(word).into_owned());

        let program = words.next().ok_or(ParseError::EmptyStage)?;
        let stage = env
            .into_iter()
            .fold(Stage::new(program, words.collect()), |stage, (name, value)| {
                stage.with_env(name, value)
            });
        Ok(stage)
    }
}

fn lock_error(what: &str) -> ShellError {
    ShellError::CommandError(CommandError::ExecutionError(format!(
        "Failed to lock {}",
        what
    )))
}
