//! Process-wide fixture for tests that start real children.
//!
//! Reaping uses `waitpid(-1, ..)`, so every test in the binary must share one
//! registry and one sweep.

use std::sync::{Arc, OnceLock};

use crate::process::{ChildRegistry, ProcessLauncher};
use crate::signals::{SignalCoordinator, SignalListener};

pub(crate) struct TestRuntime {
    pub registry: Arc<ChildRegistry>,
    pub launcher: ProcessLauncher,
    pub coordinator: Arc<SignalCoordinator>,
    _listener: SignalListener,
}

pub(crate) fn runtime() -> &'static TestRuntime {
    static RUNTIME: OnceLock<TestRuntime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        let registry = Arc::new(ChildRegistry::new());
        let coordinator = Arc::new(SignalCoordinator::new(Arc::clone(&registry), true));
        let listener = coordinator
            .listen(&[libc::SIGCHLD], || {})
            .expect("failed to subscribe to SIGCHLD");
        TestRuntime {
            launcher: ProcessLauncher::new(Arc::clone(&registry)),
            registry,
            coordinator,
            _listener: listener,
        }
    })
}
