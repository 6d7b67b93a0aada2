use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::jobs::{EventOutcome, JobId, JobStatus, JobTable, StatusChange};

/// Starts the asynchronous waiter for one job.
///
/// The waiter reports each status change of the job until it terminates or
/// is reclaimed. It holds only the job id and the job's cancellation token;
/// every change goes through the table.
pub fn spawn(jobs: Arc<JobTable>, id: JobId, quiet: bool) -> io::Result<JoinHandle<()>> {
    let handles = jobs.waiter_handles(id);
    thread::Builder::new()
        .name(format!("atrium-job-{}", id))
        .spawn(move || {
            let Some((watch, token)) = handles else {
                return;
            };
            while watch.wait_pending(&token) {
                match jobs.apply_next_event(id) {
                    EventOutcome::Gone => break,
                    EventOutcome::Unchanged => {}
                    EventOutcome::Changed(change) => {
                        if !quiet {
                            notify(&change);
                        }
                        if change.status.is_terminal() {
                            break;
                        }
                    }
                }
            }
            debug!(%id, cancelled = token.is_cancelled(), "waiter finished");
        })
}

fn notify(change: &StatusChange) {
    // Resumption is announced by whoever resumed the job.
    if change.status == JobStatus::Running {
        return;
    }
    println!("[{}]+ {}\t{}", change.id, change.status, change.command);
}
