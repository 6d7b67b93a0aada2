use super::fg::parse_job_id;
use super::{Command, CommandError, Outcome};
use crate::jobs::JobControl;

#[derive(Clone)]
pub struct BgCommand {
    job_control: JobControl,
}

impl BgCommand {
    pub fn new(job_control: JobControl) -> Self {
        Self { job_control }
    }
}

impl Command for BgCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        let id = parse_job_id("bg", args)?;
        self.job_control
            .resume(id)
            .map_err(|e| CommandError::ExecutionError(format!("bg: {}", e)))?;
        Ok(Outcome::Status(0))
    }
}
