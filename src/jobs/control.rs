use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{JobError, JobId, JobSnapshot, JobStatus, JobTable};
use crate::process::launcher::PipelineState;
use crate::process::{LaunchMode, Pipeline, ProcessLauncher, RunningPipeline, WaitOutcome};
use crate::signals::{waiter, SignalCoordinator};

/// Runs pipelines in the foreground or background and moves jobs between
/// the two.
#[derive(Debug, Clone)]
pub struct JobControl {
    jobs: Arc<JobTable>,
    launcher: ProcessLauncher,
    coordinator: Arc<SignalCoordinator>,
    quiet: bool,
}

impl JobControl {
    pub fn new(
        jobs: Arc<JobTable>,
        launcher: ProcessLauncher,
        coordinator: Arc<SignalCoordinator>,
        quiet: bool,
    ) -> Self {
        Self {
            jobs,
            launcher,
            coordinator,
            quiet,
        }
    }

    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    /// Launches `pipeline` and returns its exit status. Background launches
    /// return 0 as soon as the job is registered.
    pub fn run(
        &self,
        pipeline: Pipeline,
        mode: LaunchMode,
        env: &BTreeMap<String, String>,
    ) -> Result<i32, JobError> {
        let running = self.launcher.launch(pipeline, mode, env)?;
        match mode {
            LaunchMode::Foreground => Ok(self.wait_foreground(running)),
            LaunchMode::Background => {
                self.background(running);
                Ok(0)
            }
        }
    }

    fn background(&self, running: RunningPipeline) -> JobId {
        let last = running.last_pid().unwrap_or_default();
        let id = self.jobs.register(running);
        self.watch_job(id);
        if !self.quiet {
            println!("[{}] {}", id, last);
        }
        id
    }

    /// Blocks until the pipeline finishes or is stopped. A stopped pipeline
    /// becomes a job.
    pub fn wait_foreground(&self, mut running: RunningPipeline) -> i32 {
        let outcome = {
            let _foreground = self.coordinator.foreground(running.pids());
            running.wait()
        };

        match outcome {
            WaitOutcome::Finished(event) => {
                debug!(command = running.command(), ?event, "foreground finished");
                event.exit_code()
            }
            WaitOutcome::Stopped => {
                let command = running.command().to_string();
                let id = self.jobs.register_as(running, JobStatus::Stopped);
                self.watch_job(id);
                if !self.quiet {
                    println!();
                    println!("[{}]+ {}\t{}", id, JobStatus::Stopped, command);
                }
                JobStatus::Stopped.exit_code()
            }
        }
    }

    fn watch_job(&self, id: JobId) {
        if let Err(e) = waiter::spawn(Arc::clone(&self.jobs), id, self.quiet) {
            // Without a waiter the job still finishes; `fg` can collect it.
            warn!(%id, error = %e, "failed to start job waiter");
        }
    }

    /// Brings a job to the foreground and waits for it.
    pub fn foreground(&self, id: Option<JobId>) -> Result<i32, JobError> {
        let id = match id {
            Some(id) => id,
            None => self.jobs.current().ok_or(JobError::NoCurrentJob)?,
        };
        let job = self.jobs.reclaim(id)?;
        let status = job.status();
        let mut running = job.into_pipeline();

        if status.is_terminal() {
            if !self.quiet {
                println!("[{}]+ {}\t{}", id, status, running.command());
            }
            return Ok(match running.state() {
                PipelineState::Finished(event) => event.exit_code(),
                _ => status.exit_code(),
            });
        }

        if !self.quiet {
            println!("{}", running.command());
        }
        running.signal(libc::SIGCONT)?;
        running.mark_resumed();
        Ok(self.wait_foreground(running))
    }

    /// Continues a stopped job without waiting for it.
    pub fn resume(&self, id: Option<JobId>) -> Result<JobSnapshot, JobError> {
        let id = match id {
            Some(id) => id,
            None => self.jobs.current_stopped().ok_or(JobError::NoCurrentJob)?,
        };
        let snapshot = self.jobs.resume(id)?;
        if !self.quiet {
            println!("[{}]+ {} &", snapshot.id, snapshot.command);
        }
        Ok(snapshot)
    }
}
