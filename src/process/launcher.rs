use std::collections::BTreeMap;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::pipeline::{Endpoint, Pipeline, WiredStage};
use super::registry::ChildRegistry;
use super::signal;
use super::status::{ChildEvent, Pid};
use super::watch::ProcessWatch;
use super::ProcessError;

const TEARDOWN_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Foreground,
    Background,
}

impl LaunchMode {
    fn outer_stream(self) -> Stdio {
        match self {
            LaunchMode::Foreground => Stdio::inherit(),
            LaunchMode::Background => Stdio::null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Running,
    Stopped,
    Finished(ChildEvent),
}

#[derive(Debug)]
pub struct StageProcess {
    pid: Pid,
    program: String,
    state: StageState,
}

impl StageProcess {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, StageState::Finished(_))
    }
}

/// Aggregate state of a pipeline after folding in child events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopped,
    /// Every stage has terminated; carries the last stage's event.
    Finished(ChildEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Stopped,
    Finished(ChildEvent),
}

/// Handle to a launched pipeline: one process per stage plus the mailbox
/// their reaped statuses arrive in.
#[derive(Debug)]
pub struct RunningPipeline {
    command: String,
    stages: Vec<StageProcess>,
    watch: Arc<ProcessWatch>,
}

impl RunningPipeline {
    /// A handle over pids that were never spawned, for exercising job
    /// bookkeeping without real processes.
    #[cfg(test)]
    pub(crate) fn detached(command: &str, pids: &[Pid]) -> Self {
        Self {
            command: command.to_string(),
            stages: pids
                .iter()
                .map(|&pid| StageProcess {
                    pid,
                    program: command.to_string(),
                    state: StageState::Running,
                })
                .collect(),
            watch: Arc::new(ProcessWatch::new()),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn stages(&self) -> &[StageProcess] {
        &self.stages
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.stages.iter().map(StageProcess::pid).collect()
    }

    pub fn live_pids(&self) -> Vec<Pid> {
        self.stages
            .iter()
            .filter(|stage| !stage.is_finished())
            .map(StageProcess::pid)
            .collect()
    }

    pub fn last_pid(&self) -> Option<Pid> {
        self.stages.last().map(StageProcess::pid)
    }

    pub fn watch(&self) -> &Arc<ProcessWatch> {
        &self.watch
    }

    pub fn state(&self) -> PipelineState {
        if self.stages.iter().all(StageProcess::is_finished) {
            return match self.stages.last().map(|stage| stage.state) {
                Some(StageState::Finished(event)) => PipelineState::Finished(event),
                _ => PipelineState::Finished(ChildEvent::Lost),
            };
        }
        if self
            .stages
            .iter()
            .any(|stage| stage.state == StageState::Stopped)
        {
            PipelineState::Stopped
        } else {
            PipelineState::Running
        }
    }

    /// Folds one child event into the stage it belongs to.
    pub fn apply(&mut self, pid: Pid, event: ChildEvent) -> PipelineState {
        if let Some(stage) = self.stages.iter_mut().find(|stage| stage.pid == pid) {
            if !stage.is_finished() {
                stage.state = match event {
                    ChildEvent::Stopped(_) => StageState::Stopped,
                    ChildEvent::Continued => StageState::Running,
                    terminal => StageState::Finished(terminal),
                };
            }
        }
        self.state()
    }

    /// Marks stopped stages as running after the caller sent `SIGCONT`.
    pub fn mark_resumed(&mut self) {
        for stage in &mut self.stages {
            if stage.state == StageState::Stopped {
                stage.state = StageState::Running;
            }
        }
    }

    /// Sends `sig` to every stage that has not terminated. Returns how many
    /// processes received it.
    pub fn signal(&self, sig: libc::c_int) -> Result<usize, ProcessError> {
        let mut delivered = 0;
        for pid in self.live_pids() {
            if signal::send(pid, sig)? {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Blocks until the pipeline stops or every stage has terminated.
    pub fn wait(&mut self) -> WaitOutcome {
        loop {
            match self.state() {
                PipelineState::Finished(event) => return WaitOutcome::Finished(event),
                PipelineState::Stopped => return WaitOutcome::Stopped,
                PipelineState::Running => {}
            }
            let (pid, event) = self.watch.next_event();
            debug!(pid, ?event, command = %self.command, "pipeline event");
            self.apply(pid, event);
        }
    }
}

/// Starts every stage of a [`Pipeline`] as a child process.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    registry: Arc<ChildRegistry>,
}

impl ProcessLauncher {
    pub fn new(registry: Arc<ChildRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ChildRegistry> {
        &self.registry
    }

    /// Starts all stages before returning; nothing is waited on here.
    ///
    /// `env` is the complete environment for every stage, already merged
    /// from the ambient environment and the shell's exports.
    pub fn launch(
        &self,
        pipeline: Pipeline,
        mode: LaunchMode,
        env: &BTreeMap<String, String>,
    ) -> Result<RunningPipeline, ProcessError> {
        let command = pipeline.describe();
        let watch = Arc::new(ProcessWatch::new());
        let mut started: Vec<StageProcess> = Vec::with_capacity(pipeline.len());

        let mut wired = pipeline.into_stages().into_iter().enumerate();
        while let Some((index, stage)) = wired.next() {
            let program = stage.stage.program().to_string();
            let mut child = build_command(stage, mode, env);

            match self.registry.spawn(&mut child, &watch) {
                Ok(pid) => {
                    debug!(pid, stage = index, %program, ?mode, "stage started");
                    started.push(StageProcess {
                        pid,
                        program,
                        state: StageState::Running,
                    });
                }
                Err(source) => {
                    // Close every remaining pipe end before tearing down, so
                    // nothing started is left blocked on an open descriptor.
                    drop(child);
                    drop(wired);
                    warn!(stage = index, %program, error = %source, "stage failed to start");
                    self.teardown(&started, &watch);
                    return Err(ProcessError::Launch {
                        stage: index,
                        program,
                        source,
                    });
                }
            }
            // `child` is dropped here, closing the parent's copies of this
            // stage's pipe ends.
        }

        Ok(RunningPipeline {
            command,
            stages: started,
            watch,
        })
    }

    /// Kills and reaps the stages of a partially launched pipeline.
    fn teardown(&self, started: &[StageProcess], watch: &ProcessWatch) {
        let mut remaining: Vec<Pid> = started.iter().map(StageProcess::pid).collect();
        for &pid in &remaining {
            if let Err(e) = signal::send(pid, libc::SIGKILL) {
                warn!(pid, error = %e, "failed to kill partially launched stage");
            }
        }

        while !remaining.is_empty() {
            self.registry.reap();
            while let Some((pid, event)) = watch.pop() {
                if event.is_terminal() {
                    remaining.retain(|&p| p != pid);
                }
            }
            if !remaining.is_empty() {
                thread::sleep(TEARDOWN_POLL);
            }
        }
        debug!(count = started.len(), "partial pipeline torn down");
    }
}

fn build_command(wired: WiredStage, mode: LaunchMode, env: &BTreeMap<String, String>) -> Command {
    let WiredStage {
        stage,
        stdin,
        stdout,
    } = wired;

    let mut command = Command::new(stage.program());
    command
        .args(stage.args())
        .env_clear()
        .envs(env)
        .envs(stage.env().iter().map(|(k, v)| (k, v)))
        .stdin(stream(stdin, mode))
        .stdout(stream(stdout, mode))
        .stderr(Stdio::inherit());

    if mode == LaunchMode::Background {
        command.process_group(0);
    }
    command
}

fn stream(endpoint: Endpoint, mode: LaunchMode) -> Stdio {
    match endpoint {
        Endpoint::Shell => mode.outer_stream(),
        Endpoint::Pipe(fd) | Endpoint::Redirect(fd) => Stdio::from(fd),
    }
}
