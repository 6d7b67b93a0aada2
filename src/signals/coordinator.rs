use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGCHLD, SIGINT, SIGTSTP};
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, warn};

use super::{
    Disposition, ForegroundGuard, ForegroundSlot, InterruptCounter, SignalEvent,
    FORCE_EXIT_THRESHOLD, SIGNAL_QUEUE_DEPTH,
};
use crate::process::{signal, ChildRegistry, Pid, ProcessError};

/// Owns the shell's signal subscription and reacts to each signal.
///
/// OS signals are turned into [`SignalEvent`]s by a listener thread and
/// handed over a bounded queue to one coordinating thread, which is the only
/// place they are acted on.
#[derive(Debug)]
pub struct SignalCoordinator {
    registry: Arc<ChildRegistry>,
    interrupts: InterruptCounter,
    foreground: ForegroundSlot,
    quiet: bool,
}

impl SignalCoordinator {
    pub fn new(registry: Arc<ChildRegistry>, quiet: bool) -> Self {
        Self {
            registry,
            interrupts: InterruptCounter::new(),
            foreground: ForegroundSlot::default(),
            quiet,
        }
    }

    pub fn interrupts(&self) -> &InterruptCounter {
        &self.interrupts
    }

    pub fn registry(&self) -> &Arc<ChildRegistry> {
        &self.registry
    }

    /// Publishes `pids` as the foreground pipeline until the guard drops.
    pub fn foreground(&self, pids: Vec<Pid>) -> ForegroundGuard<'_> {
        self.foreground.occupy(pids)
    }

    /// Runs one dispatched command. Interrupts seen before or during it do
    /// not count toward a forced exit afterwards.
    pub fn dispatch<T>(&self, command: impl FnOnce() -> T) -> T {
        self.interrupts.reset();
        let result = command();
        self.interrupts.reset();
        result
    }

    pub fn handle(&self, event: SignalEvent) -> Disposition {
        match event {
            SignalEvent::Interrupt => {
                if self.interrupts.record() >= FORCE_EXIT_THRESHOLD {
                    self.notice("\nForced exit");
                    return Disposition::ForceExit;
                }
                self.forward(libc::SIGINT);
                self.notice("\nInterrupted");
            }
            SignalEvent::TerminalStop => {
                self.forward(libc::SIGTSTP);
            }
            SignalEvent::ChildStatusChanged => {
                let collected = self.registry.reap();
                debug!(collected, "reap sweep");
            }
        }
        Disposition::Continue
    }

    /// Sends `sig` to the foreground pipeline's processes that are still ours.
    /// Stages in the shell's own process group already got it from the
    /// terminal and are skipped.
    fn forward(&self, sig: libc::c_int) -> usize {
        let shell_group = signal::own_process_group();
        let mut delivered = 0;
        for pid in self.foreground.pids() {
            if !self.registry.is_tracked(pid) {
                continue;
            }
            match signal::process_group(pid) {
                Some(group) if group != shell_group => {}
                _ => continue,
            }
            match signal::send(pid, sig) {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(e) => warn!(pid, error = %e, "failed to forward signal"),
            }
        }
        debug!(signal = signal::name(sig), delivered, "forwarded to foreground");
        delivered
    }

    fn notice(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Subscribes to interrupt, terminal-stop and child-status signals and
    /// starts handling them. `on_force_exit` runs on the coordinating thread
    /// when a forced exit is requested.
    pub fn start<F>(self: &Arc<Self>, on_force_exit: F) -> Result<SignalListener, ProcessError>
    where
        F: Fn() + Send + 'static,
    {
        self.listen(&[SIGINT, SIGTSTP, SIGCHLD], on_force_exit)
    }

    pub(crate) fn listen<F>(
        self: &Arc<Self>,
        raw: &[libc::c_int],
        on_force_exit: F,
    ) -> Result<SignalListener, ProcessError>
    where
        F: Fn() + Send + 'static,
    {
        let mut signals = Signals::new(raw)
            .map_err(|e| ProcessError::Signal(format!("failed to subscribe: {}", e)))?;
        let handle = signals.handle();
        let (sender, receiver) = mpsc::sync_channel::<SignalEvent>(SIGNAL_QUEUE_DEPTH);

        let listener = thread::Builder::new()
            .name("atrium-signals".to_string())
            .spawn(move || {
                for raw in signals.forever() {
                    let Some(event) = SignalEvent::from_raw(raw) else {
                        continue;
                    };
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| ProcessError::Signal(format!("failed to start listener: {}", e)))?;

        let coordinator = Arc::clone(self);
        let worker = thread::Builder::new()
            .name("atrium-coordinator".to_string())
            .spawn(move || {
                for event in receiver {
                    if coordinator.handle(event) == Disposition::ForceExit {
                        on_force_exit();
                    }
                }
            });
        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                handle.close();
                return Err(ProcessError::Signal(format!(
                    "failed to start coordinator: {}",
                    e
                )));
            }
        };

        Ok(SignalListener {
            handle,
            threads: vec![listener, worker],
        })
    }
}

/// Running signal subscription. Dropping it leaves the threads running;
/// call [`SignalListener::close`] to stop them.
#[derive(Debug)]
pub struct SignalListener {
    handle: Handle,
    threads: Vec<JoinHandle<()>>,
}

impl SignalListener {
    pub fn close(self) {
        self.handle.close();
        for thread in self.threads {
            if thread.join().is_err() {
                warn!("signal thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> SignalCoordinator {
        SignalCoordinator::new(Arc::new(ChildRegistry::new()), true)
    }

    #[test]
    fn test_double_interrupt_forces_exit() {
        let coordinator = coordinator();
        assert_eq!(
            coordinator.handle(SignalEvent::Interrupt),
            Disposition::Continue
        );
        assert_eq!(
            coordinator.handle(SignalEvent::Interrupt),
            Disposition::ForceExit
        );
    }

    #[test]
    fn test_dispatched_command_resets_interrupts() {
        let coordinator = coordinator();
        assert_eq!(
            coordinator.handle(SignalEvent::Interrupt),
            Disposition::Continue
        );
        assert_eq!(coordinator.dispatch(|| 7), 7);
        assert_eq!(
            coordinator.handle(SignalEvent::Interrupt),
            Disposition::Continue
        );
        assert_eq!(coordinator.interrupts().count(), 1);
    }

    #[test]
    fn test_interrupt_during_command_does_not_carry_over() {
        let coordinator = coordinator();
        coordinator.dispatch(|| coordinator.handle(SignalEvent::Interrupt));
        assert_eq!(coordinator.interrupts().count(), 0);
    }

    #[test]
    fn test_forward_skips_untracked_pids() {
        let coordinator = coordinator();
        // Pid 1 is never ours; forwarding must not touch it.
        let _guard = coordinator.foreground(vec![1]);
        assert_eq!(coordinator.forward(libc::SIGINT), 0);
    }

    #[test]
    fn test_forward_only_reaches_other_process_groups() {
        use crate::process::{LaunchMode, Pipeline, Stage, WaitOutcome};

        let runtime = crate::testing::runtime();
        let coordinator = SignalCoordinator::new(Arc::clone(&runtime.registry), true);
        let env: std::collections::BTreeMap<String, String> = std::env::vars().collect();
        let sleeper = || Pipeline::build(vec![Stage::new("sleep", vec!["30".to_string()])]).unwrap();

        let mut same_group = runtime
            .launcher
            .launch(sleeper(), LaunchMode::Foreground, &env)
            .unwrap();
        let mut own_group = runtime
            .launcher
            .launch(sleeper(), LaunchMode::Background, &env)
            .unwrap();

        {
            let _guard = coordinator.foreground(same_group.pids());
            assert_eq!(coordinator.forward(libc::SIGCONT), 0);
        }
        {
            let _guard = coordinator.foreground(own_group.pids());
            assert_eq!(coordinator.forward(libc::SIGCONT), 1);
        }

        for running in [&mut same_group, &mut own_group] {
            running.signal(libc::SIGKILL).unwrap();
            assert!(matches!(running.wait(), WaitOutcome::Finished(_)));
        }
    }

    #[test]
    fn test_stop_without_foreground_is_harmless() {
        let coordinator = coordinator();
        assert_eq!(
            coordinator.handle(SignalEvent::TerminalStop),
            Disposition::Continue
        );
        assert_eq!(coordinator.interrupts().count(), 0);
    }
}
