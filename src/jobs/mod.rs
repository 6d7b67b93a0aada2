use std::fmt;
use std::str::FromStr;

pub mod control;
pub mod table;

pub use control::JobControl;
pub use table::{EventOutcome, Job, JobSnapshot, JobTable, StatusChange};

use crate::process::{ChildEvent, ProcessError};

/// Session-unique job number. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    /// Accepts `3` as well as the `%3` job-spec form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('%').unwrap_or(s).parse().map(JobId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
    Exited(i32),
    Errored,
}

impl JobStatus {
    /// Maps the final event of a pipeline's last stage to a terminal status.
    pub fn from_completion(event: ChildEvent) -> Self {
        match event {
            ChildEvent::Exited(0) => JobStatus::Done,
            ChildEvent::Exited(code) => JobStatus::Exited(code),
            _ => JobStatus::Errored,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Exited(_) | JobStatus::Errored
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            JobStatus::Running | JobStatus::Done => 0,
            JobStatus::Stopped => 128 + libc::SIGTSTP,
            JobStatus::Exited(code) => *code,
            JobStatus::Errored => 1,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Stopped => write!(f, "Stopped"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Exited(code) => write!(f, "Exited ({})", code),
            JobStatus::Errored => write!(f, "Errored"),
        }
    }
}

#[derive(Debug)]
pub enum JobError {
    NotFound(JobId),
    NotStopped(JobId),
    NoCurrentJob,
    Process(ProcessError),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::NotFound(id) => write!(f, "no such job: {}", id),
            JobError::NotStopped(id) => write!(f, "job {} is not stopped", id),
            JobError::NoCurrentJob => write!(f, "no current job"),
            JobError::Process(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::Process(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProcessError> for JobError {
    fn from(err: ProcessError) -> Self {
        JobError::Process(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_mapping() {
        assert_eq!(
            JobStatus::from_completion(ChildEvent::Exited(0)),
            JobStatus::Done
        );
        assert_eq!(
            JobStatus::from_completion(ChildEvent::Exited(7)),
            JobStatus::Exited(7)
        );
        assert_eq!(
            JobStatus::from_completion(ChildEvent::Signaled(libc::SIGKILL)),
            JobStatus::Errored
        );
        assert_eq!(
            JobStatus::from_completion(ChildEvent::Lost),
            JobStatus::Errored
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(JobStatus::Running.to_string(), "Running");
        assert_eq!(JobStatus::Exited(7).to_string(), "Exited (7)");
        assert_eq!(JobStatus::Errored.to_string(), "Errored");
    }

    #[test]
    fn test_job_id_parse() {
        assert_eq!("3".parse::<JobId>(), Ok(JobId::new(3)));
        assert_eq!("%12".parse::<JobId>(), Ok(JobId::new(12)));
        assert!("x".parse::<JobId>().is_err());
    }
}
