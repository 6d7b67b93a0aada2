use std::io;

use super::status::Pid;
use super::ProcessError;

/// Sends `signal` to one process. `Ok(false)` means it was already gone.
pub fn send(pid: Pid, signal: libc::c_int) -> Result<bool, ProcessError> {
    // SAFETY: kill(2) has no memory-safety preconditions.
    if unsafe { libc::kill(pid, signal) } == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(false)
    } else {
        Err(ProcessError::Signal(format!(
            "failed to send {} to {}: {}",
            name(signal),
            pid,
            err
        )))
    }
}

/// Process group of `pid`, or `None` once it is gone.
pub fn process_group(pid: Pid) -> Option<Pid> {
    // SAFETY: getpgid(2) has no memory-safety preconditions.
    let pgid = unsafe { libc::getpgid(pid) };
    (pgid > 0).then_some(pgid)
}

/// Process group of the shell itself.
pub fn own_process_group() -> Pid {
    // SAFETY: getpgrp(2) cannot fail.
    unsafe { libc::getpgrp() }
}

pub fn name(signal: libc::c_int) -> &'static str {
    match signal {
        libc::SIGINT => "SIGINT",
        libc::SIGTSTP => "SIGTSTP",
        libc::SIGCONT => "SIGCONT",
        libc::SIGKILL => "SIGKILL",
        libc::SIGTERM => "SIGTERM",
        libc::SIGCHLD => "SIGCHLD",
        _ => "signal",
    }
}
