use std::fmt;
use std::io;

pub mod launcher;
pub mod pipeline;
pub mod registry;
pub mod signal;
pub mod stage;
pub mod status;
pub mod watch;

pub use launcher::{LaunchMode, ProcessLauncher, RunningPipeline, WaitOutcome};
pub use pipeline::Pipeline;
pub use registry::ChildRegistry;
pub use stage::Stage;
pub use status::{ChildEvent, Pid};
pub use watch::{CancellationToken, ProcessWatch};

#[derive(Debug)]
pub enum ProcessError {
    EmptyPipeline,
    StreamAllocation(io::Error),
    Launch {
        stage: usize,
        program: String,
        source: io::Error,
    },
    Wait(String),
    Signal(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::EmptyPipeline => write!(f, "empty pipeline"),
            ProcessError::StreamAllocation(e) => write!(f, "failed to allocate pipe: {}", e),
            ProcessError::Launch {
                stage,
                program,
                source,
            } => {
                match source.kind() {
                    io::ErrorKind::NotFound => write!(f, "command not found: {}", program)?,
                    io::ErrorKind::PermissionDenied => write!(f, "permission denied: {}", program)?,
                    _ => write!(f, "{}: {}", program, source)?,
                }
                if *stage > 0 {
                    write!(f, " (pipeline stage {})", stage + 1)?;
                }
                Ok(())
            }
            ProcessError::Wait(msg) => write!(f, "wait error: {}", msg),
            ProcessError::Signal(msg) => write!(f, "signal error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::StreamAllocation(e) => Some(e),
            ProcessError::Launch { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_names_stage() {
        let err = ProcessError::Launch {
            stage: 1,
            program: "nope".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "command not found: nope (pipeline stage 2)");
    }

    #[test]
    fn test_first_stage_launch_error_is_plain() {
        let err = ProcessError::Launch {
            stage: 0,
            program: "./script".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.to_string(), "permission denied: ./script");
    }
}
