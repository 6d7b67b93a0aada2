use super::{Command, CommandError, Outcome};
use crate::jobs::{JobControl, JobId};

pub(super) fn parse_job_id(builtin: &str, args: &[String]) -> Result<Option<JobId>, CommandError> {
    match args {
        [] => Ok(None),
        [spec] => spec.parse::<JobId>().map(Some).map_err(|_| {
            CommandError::InvalidArguments(format!("{}: {}: no such job", builtin, spec))
        }),
        _ => Err(CommandError::InvalidArguments(format!(
            "{}: too many arguments",
            builtin
        ))),
    }
}

#[derive(Clone)]
pub struct FgCommand {
    job_control: JobControl,
}

impl FgCommand {
    pub fn new(job_control: JobControl) -> Self {
        Self { job_control }
    }
}

impl Command for FgCommand {
    fn execute(&self, args: &[String]) -> Result<Outcome, CommandError> {
        let id = parse_job_id("fg", args)?;
        let status = self
            .job_control
            .foreground(id)
            .map_err(|e| CommandError::ExecutionError(format!("fg: {}", e)))?;
        Ok(Outcome::Status(status))
    }
}
