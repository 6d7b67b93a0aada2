use std::collections::HashMap;
use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::status::{ChildEvent, Pid};
use super::watch::ProcessWatch;

/// Routes reaped child statuses to the pipeline that owns each pid.
///
/// Every child the shell starts goes through [`ChildRegistry::spawn`], which
/// holds the routes lock across `Command::spawn` and the route insert. The
/// sweep holds the same lock around `waitpid`, so it can neither reap a child
/// that std is still waiting on after a failed exec nor mistake a child that
/// exits immediately for an untracked one.
#[derive(Debug, Default)]
pub struct ChildRegistry {
    routes: Mutex<Routes>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn spawn(&self, command: &mut Command, watch: &Arc<ProcessWatch>) -> io::Result<Pid> {
        let mut routes = self.lock();
        let child = command.spawn()?;
        let pid = Pid::try_from(child.id()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "child pid out of range")
        })?;
        routes.insert(pid, Arc::clone(watch));
        debug!(pid, "tracking child");
        Ok(pid)
    }

    /// Hands `event` to the owner of `pid`. Returns `false` for untracked pids.
    pub fn deliver(&self, pid: Pid, event: ChildEvent) -> bool {
        deliver_to(&mut self.lock(), pid, event)
    }

    pub fn is_tracked(&self, pid: Pid) -> bool {
        self.lock().contains_key(&pid)
    }

    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    /// Non-blocking sweep: collects every child state change that is ready and
    /// routes it to its owner. Statuses of untracked children are discarded.
    /// Safe to run from several threads at once; never overlaps a spawn.
    pub fn reap(&self) -> usize {
        let flags = libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED;
        let mut routes = self.lock();
        let mut collected = 0;
        loop {
            let mut status: libc::c_int = 0;
            // SAFETY: `status` is a valid out-pointer for the duration of the call.
            let pid = unsafe { libc::waitpid(-1, &mut status, flags) };
            if pid > 0 {
                if let Some(event) = ChildEvent::from_wait_status(status) {
                    if !deliver_to(&mut routes, pid, event) {
                        debug!(pid, ?event, "discarded status of untracked child");
                    }
                    collected += 1;
                }
                continue;
            }
            if pid == 0 {
                break;
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ECHILD) => {
                    let lost = abandon_from(&mut routes);
                    if lost > 0 {
                        warn!(lost, "tracked children vanished without a status");
                    }
                    break;
                }
                _ => {
                    warn!(error = %err, "waitpid failed");
                    break;
                }
            }
        }
        collected
    }

    /// Reports `Lost` for tracked children that no longer exist, which only
    /// happens when something outside the registry reaped them.
    pub fn abandon_vanished(&self) -> usize {
        abandon_from(&mut self.lock())
    }
}

type Routes = HashMap<Pid, Arc<ProcessWatch>>;

fn deliver_to(routes: &mut Routes, pid: Pid, event: ChildEvent) -> bool {
    let Some(watch) = routes.get(&pid).cloned() else {
        return false;
    };
    if event.is_terminal() {
        routes.remove(&pid);
    }
    watch.push(pid, event);
    true
}

fn abandon_from(routes: &mut Routes) -> usize {
    let vanished: Vec<Pid> = routes
        .keys()
        .copied()
        .filter(|&pid| !process_exists(pid))
        .collect();

    for pid in &vanished {
        if let Some(watch) = routes.remove(pid) {
            watch.push(*pid, ChildEvent::Lost);
        }
    }
    vanished.len()
}

fn process_exists(pid: Pid) -> bool {
    // SAFETY: signal 0 performs the existence and permission checks only.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}
