use std::env;
use std::sync::{Arc, Mutex};

use rustyline::{error::ReadlineError, history::FileHistory, Editor};
use tracing::{debug, warn};

mod executor;

use crate::{
    core::{
        commands::{CommandExecutor, Outcome},
        config::{AliasManager, Config, ConfigPaths},
        env::EnvVarManager,
    },
    error::ShellError,
    flags::Flags,
    input::{history::DEFAULT_MAX_ENTRIES, History, ShellCompleter},
    jobs::{JobControl, JobTable},
    path::PathExpander,
    process::{ChildRegistry, ProcessLauncher},
    signals::{SignalCoordinator, SignalListener, FORCE_EXIT_THRESHOLD},
};

use executor::CommandHandler;

/// One interactive session: line input, dispatch, and the signal plumbing
/// that outlives individual commands.
pub struct Shell {
    pub(crate) flags: Flags,
    pub(crate) executor: CommandExecutor,
    pub(crate) env_vars: Arc<Mutex<EnvVarManager>>,
    pub(crate) aliases: Arc<Mutex<AliasManager>>,
    pub(crate) history: Arc<Mutex<History>>,
    pub(crate) expander: PathExpander,
    coordinator: Arc<SignalCoordinator>,
    _listener: SignalListener,
}

impl Shell {
    pub fn new(flags: Flags) -> Result<Self, ShellError> {
        let quiet = flags.is_set("quiet");

        let mut paths = ConfigPaths::new()?;
        if let Some(rc) = flags.get_value("config") {
            paths = paths.with_rc(rc);
        }
        if let Some(history) = flags.get_value("history") {
            paths = paths.with_history(history);
        }

        let config = Config::load(paths)?;
        let history = History::new(config.paths().history_path.clone(), DEFAULT_MAX_ENTRIES)?;
        debug!(
            rc = %config.paths().rc_path.display(),
            entries = history.len(),
            "session configured"
        );

        let env_vars = Arc::new(Mutex::new(config.env_vars));
        let aliases = Arc::new(Mutex::new(config.aliases));
        let history = Arc::new(Mutex::new(history));

        let registry = Arc::new(ChildRegistry::new());
        let coordinator = Arc::new(SignalCoordinator::new(Arc::clone(&registry), quiet));
        let listener = {
            let history = Arc::clone(&history);
            coordinator.start(move || {
                save_history(&history);
                std::process::exit(0);
            })?
        };

        let job_control = JobControl::new(
            Arc::new(JobTable::new()),
            ProcessLauncher::new(registry),
            Arc::clone(&coordinator),
            quiet,
        );
        let executor = CommandExecutor::new(
            job_control,
            Arc::clone(&env_vars),
            Arc::clone(&aliases),
            Arc::clone(&history),
        );

        Ok(Shell {
            flags,
            executor,
            env_vars,
            aliases,
            history,
            expander: PathExpander::new(),
            coordinator,
            _listener: listener,
        })
    }

    /// Runs until `exit`, EOF or a forced exit and returns the exit status.
    pub fn run(&mut self) -> Result<i32, ShellError> {
        if let Some(line) = self.flags.get_value("exec").cloned() {
            return Ok(self.run_line(&line).unwrap_or_else(|code| code));
        }

        let mut editor = self.editor()?;
        loop {
            let prompt = format!("{} $ ", current_dir());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(e) = editor.add_history_entry(line) {
                        warn!(error = %e, "failed to add line to editor history");
                    }
                    self.record(line);

                    if let Err(code) = self.run_line(line) {
                        self.save();
                        return Ok(code);
                    }
                    if let Some(helper) = editor.helper_mut() {
                        helper.update_aliases(self.alias_names());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    if self.coordinator.interrupts().record() >= FORCE_EXIT_THRESHOLD {
                        println!("Forced exit");
                        self.save();
                        return Ok(0);
                    }
                    if !self.flags.is_set("quiet") {
                        println!("Press Ctrl-C again to exit");
                    }
                }
                Err(ReadlineError::Eof) => {
                    self.save();
                    return Ok(0);
                }
                Err(e) => {
                    self.save();
                    return Err(e.into());
                }
            }
        }
    }

    /// Runs one line. `Err` carries the status the session should exit with.
    fn run_line(&mut self, line: &str) -> Result<i32, i32> {
        let coordinator = Arc::clone(&self.coordinator);
        let result = coordinator.dispatch(|| self.execute_command(line));

        match result {
            Ok(Outcome::Status(code)) => Ok(code),
            Ok(Outcome::Exit(code)) => Err(code),
            Err(e) => {
                eprintln!("atrium: {}", e);
                Ok(1)
            }
        }
    }

    fn editor(&self) -> Result<Editor<ShellCompleter, FileHistory>, ShellError> {
        let mut completer = ShellCompleter::new();
        completer.update_aliases(self.alias_names());

        let mut editor = Editor::<ShellCompleter, FileHistory>::new()?;
        editor.set_helper(Some(completer));

        if let Ok(history) = self.history.lock() {
            for entry in history.entries() {
                if let Err(e) = editor.add_history_entry(entry) {
                    warn!(error = %e, "failed to seed editor history");
                    break;
                }
            }
        }
        Ok(editor)
    }

    fn record(&self, line: &str) {
        match self.history.lock() {
            Ok(mut history) => history.add(line),
            Err(_) => warn!("history lock poisoned; line not recorded"),
        }
    }

    fn save(&self) {
        save_history(&self.history);
    }

    fn alias_names(&self) -> Vec<String> {
        self.aliases
            .lock()
            .map(|aliases| aliases.names())
            .unwrap_or_default()
    }
}

fn save_history(history: &Mutex<History>) {
    let Ok(history) = history.lock() else {
        warn!("history lock poisoned; not saved");
        return;
    };
    if let Err(e) = history.save() {
        eprintln!("atrium: {}", e);
    }
}

fn current_dir() -> String {
    env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "?".to_string())
}
