//! Completion handles
//!
//! A `JobHandle` is an opaque, cloneable value identifying one submitted
//! job. Duplicating a handle does not affect the job's lifetime, and a
//! handle held past the job's retirement simply reports done: the packed
//! generation no longer matches the record's.
//!
//! `JobHandleBlocked` is the handle for a blocked submission; it
//! additionally exposes the barrier operations and starts with a bias of
//! one barrier that the submitter releases once wiring is complete.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use jobsched_core::runnable::{Arguments, Completion, Runnable};
use jobsched_core::JobId;

use crate::scheduler::Core;

/// Opaque identity of a submitted job.
///
/// The raw id packs the record's pool index with the generation observed
/// at submission; the invalid sentinel is `u64::MAX`.
#[derive(Clone)]
pub struct JobHandle {
    core: Option<Arc<Core>>,
    id: JobId,
}

impl JobHandle {
    pub(crate) fn bind(core: Arc<Core>, id: JobId) -> Self {
        JobHandle {
            core: Some(core),
            id,
        }
    }

    /// A handle referring to no job. `is_done` is vacuously true.
    pub fn invalid() -> Self {
        JobHandle {
            core: None,
            id: JobId::INVALID,
        }
    }

    /// The packed 64-bit id.
    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Raw form of the id; `u64::MAX` when invalid.
    #[inline]
    pub fn raw_id(&self) -> u64 {
        self.id.as_raw()
    }

    /// True if the handle refers to some job. Useful for asserts.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.core.is_some() && self.id.is_valid()
    }

    /// Detach the handle from its job.
    pub fn invalidate(&mut self) {
        self.core = None;
        self.id = JobId::INVALID;
    }

    pub(crate) fn same_scheduler(&self, core: &Arc<Core>) -> bool {
        match &self.core {
            Some(c) => Arc::ptr_eq(c, core),
            None => false,
        }
    }

    /// True iff the job has completed at this instant. Once true, it
    /// stays true.
    pub fn is_done(&self) -> bool {
        match &self.core {
            None => true,
            Some(core) => core.job_is_done(self.id),
        }
    }

    /// Block until the job completes. Returns immediately (and
    /// repeatably) once done.
    pub fn wait(&self) {
        if let Some(core) = &self.core {
            core.wait_job(self.id);
        }
    }

    /// Bounded wait. Returns true iff the job completed before the
    /// timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match &self.core {
            None => true,
            Some(core) => core.wait_job_timeout(self.id, timeout),
        }
    }

    /// Chain a runnable onto the job's conclusion. If the job has already
    /// completed, the runnable is invoked synchronously on this thread
    /// before the call returns.
    pub fn add_completion_runnable(&self, runnable: Runnable, args: &Arguments) {
        match &self.core {
            None => runnable(args),
            Some(core) => core.add_completion_runnable(self.id, runnable, args),
        }
    }
}

impl Completion for JobHandle {
    fn is_done(&self) -> bool {
        JobHandle::is_done(self)
    }

    fn wait(&self) {
        JobHandle::wait(self)
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("id", &self.id).finish()
    }
}

/// Handle for a job inserted blocked.
///
/// Obtained from a blocked submission, which starts with one barrier (the
/// submission bias) held, so the job cannot start before the caller has
/// finished adding barriers and antecedents. Call
/// [`release_barrier`](JobHandleBlocked::release_barrier) to drop the
/// bias.
#[derive(Clone, Debug)]
pub struct JobHandleBlocked {
    handle: JobHandle,
}

impl JobHandleBlocked {
    pub(crate) fn bind(core: Arc<Core>, id: JobId) -> Self {
        JobHandleBlocked {
            handle: JobHandle::bind(core, id),
        }
    }

    /// A blocked handle referring to no job.
    pub fn invalid() -> Self {
        JobHandleBlocked {
            handle: JobHandle::invalid(),
        }
    }

    /// Add `count` barriers to the job and return a release runnable.
    ///
    /// The binding is written into `args`; the returned runnable must be
    /// invoked with that same blob — there is only one `Arguments`
    /// instance, not an array — once per added barrier, from any thread,
    /// raw or as a scheduled job. Only valid while the job is still being
    /// configured or blocked.
    pub fn add_barrier(&self, args: &mut Arguments, count: u32) -> Runnable {
        debug_assert!(self.handle.is_valid());
        self.handle
            .core
            .as_ref()
            .expect("add_barrier on an invalid handle")
            .add_barrier(self.handle.id, args, count)
    }

    /// Release `count` barriers. The release that drives the count to
    /// zero makes the job ready.
    pub fn release_barrier(&self, count: u32) {
        if let Some(core) = &self.handle.core {
            core.release_barrier(self.handle.id, count);
        }
    }

    /// Discard the blocked-specific surface, keeping the plain handle.
    pub fn into_handle(self) -> JobHandle {
        self.handle
    }
}

impl Deref for JobHandleBlocked {
    type Target = JobHandle;

    fn deref(&self) -> &JobHandle {
        &self.handle
    }
}

impl DerefMut for JobHandleBlocked {
    fn deref_mut(&mut self) -> &mut JobHandle {
        &mut self.handle
    }
}

impl From<JobHandleBlocked> for JobHandle {
    fn from(blocked: JobHandleBlocked) -> JobHandle {
        blocked.into_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle() {
        let h = JobHandle::invalid();
        assert!(!h.is_valid());
        assert_eq!(h.raw_id(), u64::MAX);
        assert!(h.is_done());
        h.wait(); // returns immediately
        assert!(h.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_invalidate() {
        let mut h = JobHandle::invalid();
        h.invalidate();
        assert!(!h.is_valid());
        assert_eq!(h.id(), JobId::INVALID);
    }

    #[test]
    fn test_invalid_handle_runs_completion_synchronously() {
        use std::sync::atomic::{AtomicBool, Ordering};

        fn body(args: &Arguments) {
            let flag = unsafe { &*(args.a0 as *const AtomicBool) };
            flag.store(true, Ordering::SeqCst);
        }

        let ran = AtomicBool::new(false);
        let args = Arguments::new(&ran as *const AtomicBool as usize, 0, 0, 0);

        let h = JobHandle::invalid();
        h.add_completion_runnable(body, &args);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_blocked_invalid_release_is_noop() {
        let h = JobHandleBlocked::invalid();
        h.release_barrier(1);
        assert!(h.is_done());
    }
}
