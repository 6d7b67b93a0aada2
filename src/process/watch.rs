use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::status::{ChildEvent, Pid};

/// Set once when a job is reclaimed; tells its waiter to stop consuming events.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Mailbox of child events for the processes of one pipeline.
///
/// The reaper pushes events in; exactly one consumer (the foreground wait or
/// a job waiter) pops them out. Events stay queued until consumed, so a
/// pipeline can change hands between consumers without losing any.
#[derive(Debug, Default)]
pub struct ProcessWatch {
    events: Mutex<VecDeque<(Pid, ChildEvent)>>,
    ready: Condvar,
}

impl ProcessWatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(Pid, ChildEvent)>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, pid: Pid, event: ChildEvent) {
        self.lock().push_back((pid, event));
        self.ready.notify_all();
    }

    /// Wakes blocked consumers so they can re-check their cancellation token.
    pub fn wake(&self) {
        let _events = self.lock();
        self.ready.notify_all();
    }

    pub fn pop(&self) -> Option<(Pid, ChildEvent)> {
        self.lock().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Blocks until an event is available and takes it.
    pub fn next_event(&self) -> (Pid, ChildEvent) {
        let mut events = self.lock();
        loop {
            if let Some(event) = events.pop_front() {
                return event;
            }
            events = self
                .ready
                .wait(events)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until an event is queued (returns `true`) or `token` is
    /// cancelled (returns `false`). Does not consume the event.
    pub fn wait_pending(&self, token: &CancellationToken) -> bool {
        let mut events = self.lock();
        loop {
            if token.is_cancelled() {
                return false;
            }
            if !events.is_empty() {
                return true;
            }
            events = self
                .ready
                .wait(events)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
