use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{JobError, JobId, JobStatus};
use crate::process::launcher::PipelineState;
use crate::process::{CancellationToken, Pid, ProcessWatch, RunningPipeline};

/// One backgrounded (or stopped) pipeline owned by the [`JobTable`].
#[derive(Debug)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    token: CancellationToken,
    pipeline: RunningPipeline,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn command(&self) -> &str {
        self.pipeline.command()
    }

    pub fn pipeline(&self) -> &RunningPipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> RunningPipeline {
        self.pipeline
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            command: self.pipeline.command().to_string(),
            pids: self.pipeline.pids(),
        }
    }
}

/// Point-in-time copy of a job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub command: String,
    pub pids: Vec<Pid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: JobId,
    pub status: JobStatus,
    pub command: String,
}

/// Result of feeding one queued child event into a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The job is no longer in the table (reclaimed or cleared).
    Gone,
    Unchanged,
    Changed(StatusChange),
}

#[derive(Debug)]
struct TableState {
    next_id: u64,
    jobs: BTreeMap<JobId, Job>,
}

/// Registry of background jobs.
///
/// A single mutex guards every record. Waiters only change a job while
/// holding it and only if the job is still present, so once
/// [`JobTable::reclaim`] has removed a job nothing else can touch it.
#[derive(Debug)]
pub struct JobTable {
    state: Mutex<TableState>,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState {
                next_id: 1,
                jobs: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, pipeline: RunningPipeline) -> JobId {
        self.register_as(pipeline, JobStatus::Running)
    }

    pub fn register_as(&self, pipeline: RunningPipeline, status: JobStatus) -> JobId {
        let mut state = self.lock();
        let id = JobId(state.next_id);
        state.next_id += 1;
        debug!(%id, %status, command = pipeline.command(), "job registered");
        state.jobs.insert(
            id,
            Job {
                id,
                status,
                token: CancellationToken::new(),
                pipeline,
            },
        );
        id
    }

    /// Snapshot of every job, ordered by id.
    pub fn list(&self) -> Vec<JobSnapshot> {
        self.lock().jobs.values().map(Job::snapshot).collect()
    }

    pub fn get(&self, id: JobId) -> Result<JobSnapshot, JobError> {
        self.lock()
            .jobs
            .get(&id)
            .map(Job::snapshot)
            .ok_or(JobError::NotFound(id))
    }

    /// Removes the job and cancels its waiter. Queued child events stay in
    /// the pipeline's watch for the new owner.
    pub fn reclaim(&self, id: JobId) -> Result<Job, JobError> {
        let job = self.lock().jobs.remove(&id).ok_or(JobError::NotFound(id))?;
        job.token.cancel();
        job.pipeline.watch().wake();
        debug!(%id, "job reclaimed");
        Ok(job)
    }

    /// Returns `false` without effect when the job has already been removed.
    pub fn update_status(&self, id: JobId, status: JobStatus) -> bool {
        match self.lock().jobs.get_mut(&id) {
            Some(job) => {
                job.status = status;
                true
            }
            None => false,
        }
    }

    /// What a waiter needs to block on the job's events.
    pub fn waiter_handles(&self, id: JobId) -> Option<(Arc<ProcessWatch>, CancellationToken)> {
        self.lock()
            .jobs
            .get(&id)
            .map(|job| (Arc::clone(job.pipeline.watch()), job.token.clone()))
    }

    /// Takes one queued event from the job's watch and folds it into the
    /// job's status. The event is only consumed while the job is present.
    pub fn apply_next_event(&self, id: JobId) -> EventOutcome {
        let mut state = self.lock();
        let Some(job) = state.jobs.get_mut(&id) else {
            return EventOutcome::Gone;
        };
        if job.token.is_cancelled() {
            return EventOutcome::Gone;
        }
        let Some((pid, event)) = job.pipeline.watch().pop() else {
            return EventOutcome::Unchanged;
        };

        let status = match job.pipeline.apply(pid, event) {
            PipelineState::Running => JobStatus::Running,
            PipelineState::Stopped => JobStatus::Stopped,
            PipelineState::Finished(last) => JobStatus::from_completion(last),
        };
        if status == job.status {
            return EventOutcome::Unchanged;
        }
        debug!(%id, from = %job.status, to = %status, "job status changed");
        job.status = status;
        EventOutcome::Changed(StatusChange {
            id,
            status,
            command: job.pipeline.command().to_string(),
        })
    }

    /// Continues a stopped job in the background.
    pub fn resume(&self, id: JobId) -> Result<JobSnapshot, JobError> {
        let mut state = self.lock();
        let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
        if job.status != JobStatus::Stopped {
            return Err(JobError::NotStopped(id));
        }
        job.pipeline.signal(libc::SIGCONT)?;
        job.pipeline.mark_resumed();
        job.status = JobStatus::Running;
        Ok(job.snapshot())
    }

    /// The most recently registered job.
    pub fn current(&self) -> Option<JobId> {
        self.lock().jobs.keys().next_back().copied()
    }

    pub fn current_stopped(&self) -> Option<JobId> {
        self.lock()
            .jobs
            .values()
            .rev()
            .find(|job| job.status == JobStatus::Stopped)
            .map(Job::id)
    }

    /// Drops every terminated job, returning what was removed.
    pub fn remove_finished(&self) -> Vec<JobSnapshot> {
        let mut state = self.lock();
        let finished: Vec<JobId> = state
            .jobs
            .values()
            .filter(|job| job.status.is_terminal())
            .map(Job::id)
            .collect();

        finished
            .into_iter()
            .filter_map(|id| state.jobs.remove(&id))
            .map(|job| {
                job.token.cancel();
                job.snapshot()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ChildEvent;
    use crate::signals::waiter;
    use std::thread;

    fn fake(command: &str, pid: Pid) -> RunningPipeline {
        RunningPipeline::detached(command, &[pid])
    }

    #[test]
    fn test_ids_are_never_reused() {
        let table = JobTable::new();
        let first = table.register(fake("a", 900_001));
        let second = table.register(fake("b", 900_002));
        assert!(second > first);

        table.reclaim(second).expect("reclaim");
        let third = table.register(fake("c", 900_003));
        assert!(third > second);
        assert_eq!(first, JobId::new(1));
        assert_eq!(third, JobId::new(3));
    }

    #[test]
    fn test_reclaim_unknown_job() {
        let table = JobTable::new();
        assert!(matches!(
            table.reclaim(JobId::new(9)),
            Err(JobError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_after_reclaim_is_noop() {
        let table = JobTable::new();
        let id = table.register(fake("sleep 1", 900_010));
        assert!(table.update_status(id, JobStatus::Stopped));
        assert_eq!(table.get(id).expect("job").status, JobStatus::Stopped);

        table.reclaim(id).expect("reclaim");
        assert!(!table.update_status(id, JobStatus::Done));
        assert!(matches!(table.get(id), Err(JobError::NotFound(_))));
        assert_eq!(table.apply_next_event(id), EventOutcome::Gone);
    }

    #[test]
    fn test_events_drive_status() {
        let table = JobTable::new();
        let id = table.register(fake("job", 900_020));
        let (watch, _token) = table.waiter_handles(id).expect("handles");

        watch.push(900_020, ChildEvent::Stopped(libc::SIGTSTP));
        assert!(matches!(
            table.apply_next_event(id),
            EventOutcome::Changed(StatusChange {
                status: JobStatus::Stopped,
                ..
            })
        ));
        watch.push(900_020, ChildEvent::Continued);
        table.apply_next_event(id);
        assert_eq!(table.get(id).expect("job").status, JobStatus::Running);

        watch.push(900_020, ChildEvent::Exited(7));
        table.apply_next_event(id);
        assert_eq!(table.get(id).expect("job").status, JobStatus::Exited(7));
        assert_eq!(table.apply_next_event(id), EventOutcome::Unchanged);
    }

    #[test]
    fn test_current_and_cleanup() {
        let table = JobTable::new();
        let a = table.register(fake("a", 900_030));
        let b = table.register_as(fake("b", 900_031), JobStatus::Stopped);
        let c = table.register(fake("c", 900_032));

        assert_eq!(table.current(), Some(c));
        assert_eq!(table.current_stopped(), Some(b));

        table.update_status(a, JobStatus::Done);
        table.update_status(c, JobStatus::Errored);
        let removed: Vec<JobId> = table.remove_finished().iter().map(|j| j.id).collect();
        assert_eq!(removed, vec![a, c]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resume_requires_stopped() {
        let table = JobTable::new();
        let id = table.register(fake("a", 900_040));
        assert!(matches!(table.resume(id), Err(JobError::NotStopped(_))));
    }

    #[test]
    fn test_concurrent_reclaim_never_resurrects() {
        let table = Arc::new(JobTable::new());
        let base: Pid = 910_000;

        let ids: Vec<JobId> = (0..10)
            .map(|i| table.register(fake(&format!("job {i}"), base + i)))
            .collect();
        let waiters: Vec<_> = ids
            .iter()
            .map(|&id| waiter::spawn(Arc::clone(&table), id, true).expect("waiter"))
            .collect();
        let watches: Vec<_> = ids
            .iter()
            .map(|&id| table.waiter_handles(id).expect("handles").0)
            .collect();

        let pusher = thread::spawn(move || {
            for (i, watch) in watches.iter().enumerate() {
                watch.push(base + i as Pid, ChildEvent::Exited(i as i32));
            }
        });

        let reclaimed: Vec<Job> = ids[..5]
            .iter()
            .map(|&id| table.reclaim(id).expect("reclaim"))
            .collect();

        pusher.join().expect("pusher panicked");
        for handle in waiters {
            handle.join().expect("waiter panicked");
        }

        assert_eq!(table.len(), 5);
        for job in &reclaimed {
            assert!(matches!(table.get(job.id()), Err(JobError::NotFound(_))));
            // Either the waiter applied the exit before the reclaim or the
            // event is still queued for the new owner; never both.
            let queued = job.pipeline().watch().pending();
            let applied = usize::from(job.status().is_terminal());
            assert_eq!(queued + applied, 1, "job {}", job.id());
        }
        for &id in &ids[5..] {
            assert!(table.get(id).expect("job").status.is_terminal());
        }
    }
}
