use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod coordinator;
pub mod waiter;

pub use coordinator::{SignalCoordinator, SignalListener};

use crate::process::Pid;

/// Interrupts needed, with no command completing in between, to force exit.
pub const FORCE_EXIT_THRESHOLD: usize = 2;

/// Capacity of the queue between the signal listener and the coordinator.
pub const SIGNAL_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Interrupt,
    TerminalStop,
    ChildStatusChanged,
}

impl SignalEvent {
    pub fn from_raw(signal: libc::c_int) -> Option<Self> {
        match signal {
            libc::SIGINT => Some(SignalEvent::Interrupt),
            libc::SIGTSTP => Some(SignalEvent::TerminalStop),
            libc::SIGCHLD => Some(SignalEvent::ChildStatusChanged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    ForceExit,
}

/// Consecutive interrupts seen since the last dispatched command.
#[derive(Debug, Default)]
pub struct InterruptCounter(AtomicUsize);

impl InterruptCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one interrupt and returns the new total.
    pub fn record(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn should_force_exit(&self) -> bool {
        self.count() >= FORCE_EXIT_THRESHOLD
    }
}

/// Pids of the pipeline the interactive loop is currently waiting on.
#[derive(Debug, Default)]
pub struct ForegroundSlot {
    pids: Mutex<Vec<Pid>>,
}

impl ForegroundSlot {
    fn lock(&self) -> MutexGuard<'_, Vec<Pid>> {
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn occupy(&self, pids: Vec<Pid>) -> ForegroundGuard<'_> {
        *self.lock() = pids;
        ForegroundGuard { slot: self }
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Clears the foreground slot when dropped.
#[derive(Debug)]
pub struct ForegroundGuard<'a> {
    slot: &'a ForegroundSlot,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.slot.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_counter() {
        let counter = InterruptCounter::new();
        assert_eq!(counter.record(), 1);
        assert!(!counter.should_force_exit());
        assert_eq!(counter.record(), 2);
        assert!(counter.should_force_exit());
        counter.reset();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_foreground_guard_clears_slot() {
        let slot = ForegroundSlot::default();
        {
            let _guard = slot.occupy(vec![10, 11]);
            assert_eq!(slot.pids(), vec![10, 11]);
        }
        assert!(slot.is_empty());
    }

    #[test]
    fn test_raw_signal_mapping() {
        assert_eq!(
            SignalEvent::from_raw(libc::SIGINT),
            Some(SignalEvent::Interrupt)
        );
        assert_eq!(
            SignalEvent::from_raw(libc::SIGCHLD),
            Some(SignalEvent::ChildStatusChanged)
        );
        assert_eq!(SignalEvent::from_raw(libc::SIGHUP), None);
    }
}
