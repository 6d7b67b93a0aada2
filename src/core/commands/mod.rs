use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

mod alias;
mod bg;
mod cd;
mod exit;
mod export;
mod fg;
mod history;
mod jobs;
mod set;

pub use alias::AliasCommand;
pub use bg::BgCommand;
pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use export::ExportCommand;
pub use fg::FgCommand;
pub use history::HistoryCommand;
pub use jobs::JobsCommand;
pub use set::SetCommand;

use crate::core::config::AliasManager;
use crate::core::env::{EnvError, EnvVarManager};
use crate::input::{History, HistoryError};
use crate::jobs::{JobControl, JobError};
use crate::process::{LaunchMode, Pipeline, ProcessError, Stage};

/// Names resolved as builtins, matched exactly against the first word.
pub const BUILTINS: [&str; 9] = [
    "alias", "bg", "cd", "exit", "export", "fg", "history", "jobs", "set",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

#[derive(Debug)]
pub enum CommandError {
    InvalidArguments(String),
    ExecutionError(String),
    IoError(std::io::Error),
    ProcessError(ProcessError),
    JobError(JobError),
    HistoryError(HistoryError),
    EnvError(EnvError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::InvalidArguments(msg) => write!(f, "{}", msg),
            CommandError::ExecutionError(msg) => write!(f, "{}", msg),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
            CommandError::ProcessError(err) => write!(f, "{}", err),
            CommandError::JobError(err) => write!(f, "{}", err),
            CommandError::HistoryError(err) => write!(f, "{}", err),
            CommandError::EnvError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::IoError(err)
    }
}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::ProcessError(err)
    }
}

impl From<JobError> for CommandError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Process(err) => CommandError::ProcessError(err),
            other => CommandError::JobError(other),
        }
    }
}

impl From<HistoryError> for CommandError {
    fn from(err: HistoryError) -> Self {
        CommandError::HistoryError(err)
    }
}

impl From<EnvError> for CommandError {
    fn from(err: EnvError) -> Self {
        CommandError::EnvError(err)
    }
}

/// What the session should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(i32),
    Exit(i32),
}

pub trait Command {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError>;
}

#[derive(Clone)]
enum CommandType {
    Cd(CdCommand),
    Exit(ExitCommand),
    Alias(AliasCommand),
    History(HistoryCommand),
    Export(ExportCommand),
    Set(SetCommand),
    Jobs(JobsCommand),
    Fg(FgCommand),
    Bg(BgCommand),
}

impl Command for CommandType {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        match self {
            CommandType::Cd(cmd) => cmd.execute(args),
            CommandType::Exit(cmd) => cmd.execute(args),
            CommandType::Alias(cmd) => cmd.execute(args),
            CommandType::History(cmd) => cmd.execute(args),
            CommandType::Export(cmd) => cmd.execute(args),
            CommandType::Set(cmd) => cmd.execute(args),
            CommandType::Jobs(cmd) => cmd.execute(args),
            CommandType::Fg(cmd) => cmd.execute(args),
            CommandType::Bg(cmd) => cmd.execute(args),
        }
    }
}

/// Resolves a parsed command to a builtin or an external pipeline.
#[derive(Clone)]
pub struct CommandExecutor {
    commands: BTreeMap<String, CommandType>,
    job_control: JobControl,
    env_vars: Arc<Mutex<EnvVarManager>>,
}

impl CommandExecutor {
    pub fn new(
        job_control: JobControl,
        env_vars: Arc<Mutex<EnvVarManager>>,
        aliases: Arc<Mutex<AliasManager>>,
        history: Arc<Mutex<History>>,
    ) -> Self {
        let mut commands = BTreeMap::new();
        commands.insert("cd".to_string(), CommandType::Cd(CdCommand::new()));
        commands.insert("exit".to_string(), CommandType::Exit(ExitCommand::new()));
        commands.insert(
            "alias".to_string(),
            CommandType::Alias(AliasCommand::new(aliases)),
        );
        commands.insert(
            "history".to_string(),
            CommandType::History(HistoryCommand::new(history)),
        );
        commands.insert(
            "export".to_string(),
            CommandType::Export(ExportCommand::new(Arc::clone(&env_vars))),
        );
        commands.insert(
            "set".to_string(),
            CommandType::Set(SetCommand::new(Arc::clone(&env_vars))),
        );
        commands.insert(
            "jobs".to_string(),
            CommandType::Jobs(JobsCommand::new(Arc::clone(job_control.jobs()))),
        );
        commands.insert(
            "fg".to_string(),
            CommandType::Fg(FgCommand::new(job_control.clone())),
        );
        commands.insert(
            "bg".to_string(),
            CommandType::Bg(BgCommand::new(job_control.clone())),
        );

        Self {
            commands,
            job_control,
            env_vars,
        }
    }

    pub fn is_builtin(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// Runs one parsed line. Builtins run in-process and only as a single
    /// stage; anything else becomes an external pipeline.
    pub fn execute(&self, stages: Vec<Stage>, background: bool) -> Result<Outcome, CommandError> {
        if stages.is_empty() {
            return Ok(Outcome::Status(0));
        }

        if let [stage] = stages.as_slice() {
            if let Some(cmd) = self.commands.get(stage.program()) {
                if background {
                    debug!(builtin = stage.program(), "ignoring & for builtin");
                }
                return cmd.execute(stage.args());
            }
        }

        if let Some(stage) = stages.iter().find(|s| self.is_builtin(s.program())) {
            return Err(CommandError::InvalidArguments(format!(
                "{}: builtins cannot be part of a pipeline",
                stage.program()
            )));
        }

        let env = self
            .env_vars
            .lock()
            .map_err(|_| CommandError::ExecutionError("Failed to lock environment".to_string()))?
            .merged();
        let mode = if background {
            LaunchMode::Background
        } else {
            LaunchMode::Foreground
        };

        let pipeline = Pipeline::build(stages)?;
        let status = self.job_control.run(pipeline, mode, &env)?;
        Ok(Outcome::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobTable;
    use crate::testing;

    fn setup() -> (CommandExecutor, Arc<Mutex<EnvVarManager>>) {
        let runtime = testing::runtime();
        let control = JobControl::new(
            Arc::new(JobTable::new()),
            runtime.launcher.clone(),
            Arc::clone(&runtime.coordinator),
            true,
        );
        let dir = std::env::temp_dir().join("atrium-executor-test-history");
        let history = History::new(dir, 10).unwrap();
        let env_vars = Arc::new(Mutex::new(EnvVarManager::new()));
        let executor = CommandExecutor::new(
            control,
            Arc::clone(&env_vars),
            Arc::new(Mutex::new(AliasManager::new())),
            Arc::new(Mutex::new(history)),
        );
        (executor, env_vars)
    }

    fn stage(line: &str) -> Stage {
        let mut words = line.split_whitespace().map(String::from);
        let program = words.next().unwrap();
        Stage::new(program, words.collect())
    }

    fn sh(script: &str) -> Stage {
        Stage::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_builtin_detection() {
        let (executor, _) = setup();
        for name in BUILTINS {
            assert!(executor.is_builtin(name));
            assert!(is_builtin(name));
        }
        assert!(!executor.is_builtin("ls"));
        assert!(!executor.is_builtin(""));
    }

    #[test]
    fn test_external_exit_status() {
        let (executor, _) = setup();
        assert_eq!(
            executor.execute(vec![sh("exit 3")], false).unwrap(),
            Outcome::Status(3)
        );
    }

    #[test]
    fn test_exported_vars_reach_children() {
        let (executor, env_vars) = setup();
        env_vars
            .lock()
            .unwrap()
            .export("ATRIUM_EXPORT_TEST", "yes")
            .unwrap();
        assert_eq!(
            executor
                .execute(vec![sh("test \"$ATRIUM_EXPORT_TEST\" = yes")], false)
                .unwrap(),
            Outcome::Status(0)
        );
    }

    #[test]
    fn test_builtin_rejected_in_pipeline() {
        let (executor, _) = setup();
        let result = executor.execute(vec![stage("echo hi"), stage("cd /tmp")], false);
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_unknown_program_is_launch_error() {
        let (executor, _) = setup();
        let result = executor.execute(vec![stage("atrium-no-such-program-xyz")], false);
        match result {
            Err(CommandError::ProcessError(err)) => {
                assert_eq!(err.to_string(), "command not found: atrium-no-such-program-xyz");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_exit_builtin_outcome() {
        let (executor, _) = setup();
        assert_eq!(
            executor.execute(vec![stage("exit 4")], false).unwrap(),
            Outcome::Exit(4)
        );
    }

    #[test]
    fn test_command_error_display() {
        let errors = vec![
            CommandError::InvalidArguments("bad args".to_string()),
            CommandError::ExecutionError("failed".to_string()),
            CommandError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "io error",
            )),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
