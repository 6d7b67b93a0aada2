pub type Pid = libc::pid_t;

/// A state change reported for one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEvent {
    Exited(i32),
    Signaled(i32),
    Stopped(i32),
    Continued,
    /// The child disappeared without its status being observed by us.
    Lost,
}

impl ChildEvent {
    /// Decodes a raw status word as filled in by `waitpid`.
    pub fn from_wait_status(status: libc::c_int) -> Option<Self> {
        if libc::WIFEXITED(status) {
            Some(ChildEvent::Exited(libc::WEXITSTATUS(status)))
        } else if libc::WIFSIGNALED(status) {
            Some(ChildEvent::Signaled(libc::WTERMSIG(status)))
        } else if libc::WIFSTOPPED(status) {
            Some(ChildEvent::Stopped(libc::WSTOPSIG(status)))
        } else if libc::WIFCONTINUED(status) {
            Some(ChildEvent::Continued)
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChildEvent::Exited(_) | ChildEvent::Signaled(_) | ChildEvent::Lost
        )
    }

    /// Shell convention: the exit code, or 128 + signal for a killed process.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChildEvent::Exited(code) => *code,
            ChildEvent::Signaled(signal) | ChildEvent::Stopped(signal) => 128 + signal,
            ChildEvent::Continued => 0,
            ChildEvent::Lost => 1,
        }
    }
}
