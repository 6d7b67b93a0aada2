use super::{Command, CommandError, Outcome};
use crate::jobs::JobTable;
use std::sync::Arc;

/// Lists jobs, then drops the finished ones from the table.
#[derive(Clone)]
pub struct JobsCommand {
    jobs: Arc<JobTable>,
}

impl JobsCommand {
    pub fn new(jobs: Arc<JobTable>) -> Self {
        Self { jobs }
    }
}

impl Command for JobsCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        match args.first().map(String::as_str) {
            None => {
                for job in self.jobs.list() {
                    println!("[{}] {}\t{}", job.id, job.status, job.command);
                }
                self.jobs.remove_finished();
            }
            Some("-c") | Some("--cleanup") => {
                self.jobs.remove_finished();
            }
            Some(other) => {
                return Err(CommandError::InvalidArguments(format!(
                    "jobs: {}: invalid option",
                    other
                )))
            }
        }
        Ok(Outcome::Status(0))
    }
}
