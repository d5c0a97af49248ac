//! Scheduler core
//!
//! Owns the record pool, the ready queue, and the worker pool, and
//! implements the submission protocol:
//!
//! - a ready submission publishes a fully configured record, then
//!   enqueues it;
//! - a blocked submission publishes with a bias of one on the pending
//!   barrier counter, which the caller releases once wiring is done;
//! - a dependent submission starts from `antecedent_count + 1` (the extra
//!   one is the wiring bias) and antecedents push it down as they retire;
//!   whoever drives the counter to zero owns the enqueue.
//!
//! Retirement runs completion runnables in insertion order, then
//! decrements successors, then signals waiters under the record's
//! completion monitor, and finally recycles the record under an advanced
//! generation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jobsched_core::runnable::{adapt, noop_runnable, Arguments, Runnable};
use jobsched_core::{jdebug, jprint, jtrace};
use jobsched_core::{JobId, JobState, SchedResult};

use crate::config::SchedulerConfig;
use crate::handle::{JobHandle, JobHandleBlocked};
use crate::pool::RecordPool;
use crate::ready_queue::ReadyQueue;
use crate::worker::{current_thread_id, WorkerPool, WorkerStats};

/// Shared state behind every handle and worker.
pub(crate) struct Core {
    pub(crate) pool: RecordPool,
    pub(crate) ready: ReadyQueue,
    pub(crate) shutdown: AtomicBool,
    pub(crate) worker_stats: Box<[WorkerStats]>,
}

impl Core {
    fn new(config: &SchedulerConfig) -> Core {
        Core {
            pool: RecordPool::new(config.record_pool_capacity),
            ready: ReadyQueue::new(config.ready_queue_capacity),
            shutdown: AtomicBool::new(false),
            worker_stats: (0..config.worker_count).map(|_| WorkerStats::new()).collect(),
        }
    }

    /// True iff the job named by `id` has completed (or `id` is stale).
    pub(crate) fn job_is_done(&self, id: JobId) -> bool {
        if id.is_invalid() {
            return true;
        }
        let rec = self.pool.record(id.index());
        rec.generation() != id.generation() || rec.is_done()
    }

    /// Block until the job completes. Returns immediately when already
    /// done; calling again after completion is a no-op.
    pub(crate) fn wait_job(&self, id: JobId) {
        if self.job_is_done(id) {
            return;
        }
        let monitor = self.pool.monitor_for(id.index());
        let guard = monitor.lock();
        let _guard = monitor.wait_while(guard, |_| !self.job_is_done(id));
    }

    /// Bounded wait; true iff the job completed before the deadline.
    pub(crate) fn wait_job_timeout(&self, id: JobId, timeout: Duration) -> bool {
        if self.job_is_done(id) {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let monitor = self.pool.monitor_for(id.index());
        let mut guard = monitor.lock();
        loop {
            if self.job_is_done(id) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (g, _timed_out) =
                monitor.wait_timeout_while(guard, deadline - now, |_| !self.job_is_done(id));
            guard = g;
        }
    }

    /// Chain a runnable onto the job's conclusion. If the job already
    /// retired (or `id` is stale), the runnable runs here, synchronously.
    pub(crate) fn add_completion_runnable(&self, id: JobId, runnable: Runnable, args: &Arguments) {
        let appended = id.is_valid()
            && self
                .pool
                .record(id.index())
                .try_push_completion(runnable, *args, id.generation());
        if !appended {
            runnable(args);
        }
    }

    /// Add `count` to the job's pending barrier counter and hand back the
    /// release trampoline. The binding (this core, the record, the
    /// generation) is written into `args`; the returned runnable must be
    /// invoked with that same blob, once per added count.
    pub(crate) fn add_barrier(&self, id: JobId, args: &mut Arguments, count: u32) -> Runnable {
        debug_assert!(id.is_valid());
        let rec = self.pool.record(id.index());
        debug_assert_eq!(rec.generation(), id.generation());
        debug_assert!(rec.state().accepts_barriers());

        let prev = rec.add_pending(count as i32);
        debug_assert!(prev > 0, "barrier added to a job with no outstanding bias");

        *args = Arguments::new(
            self as *const Core as usize,
            id.index() as usize,
            id.generation() as usize,
            0,
        );
        barrier_release_runnable
    }

    /// Release `count` barriers. The caller that drives the counter to
    /// zero transitions the job to Ready and enqueues it.
    pub(crate) fn release_barrier(&self, id: JobId, count: u32) {
        if id.is_invalid() {
            return;
        }
        let rec = self.pool.record(id.index());
        if rec.generation() != id.generation() {
            return;
        }
        let count = count as i32;
        let prev = rec.sub_pending(count);
        debug_assert!(prev >= count, "barrier count underflow");
        if prev == count {
            rec.set_state(JobState::Ready);
            self.ready.push(id.index());
        }
    }

    /// Attach `dependent` to an antecedent's successor list. False means
    /// the antecedent is invalid, stale, or already drained, and the
    /// caller must decrement the dependent itself.
    fn try_attach_successor(&self, antecedent: JobId, dependent: JobId) -> bool {
        if antecedent.is_invalid() {
            return false;
        }
        self.pool
            .record(antecedent.index())
            .try_push_successor(dependent, antecedent.generation())
    }

    /// Execute one popped job through to recycling.
    pub(crate) fn run_job(&self, index: u32) {
        let rec = self.pool.record(index);
        debug_assert_eq!(rec.state(), JobState::Ready);
        rec.set_state(JobState::Running);
        jprint::set_job_index(index);

        let (runnable, args) = rec.take_body();
        runnable(&args);

        rec.set_state(JobState::Retiring);
        jtrace!("retiring");

        // Completion runnables run strictly after the body and strictly
        // before successor barriers drop.
        for (r, a) in rec.drain_completions() {
            r(&a);
        }
        for dependent in rec.drain_successors() {
            self.release_barrier(dependent, 1);
        }

        {
            let monitor = self.pool.monitor_for(index);
            let _guard = monitor.lock();
            rec.set_done();
            monitor.notify_all();
        }

        jprint::clear_job_index();
        self.pool.release(index);
    }
}

/// Trampoline returned by `add_barrier`. Decodes the binding that
/// `add_barrier` wrote into the blob; the scheduler owning the job must
/// outlive every invocation.
fn barrier_release_runnable(args: &Arguments) {
    let core = unsafe { &*(args.a0 as *const Core) };
    core.release_barrier(JobId::new(args.a1 as u32, args.a2 as u32), 1);
}

/// Worker thread body: drain the ready queue until the sentinel.
pub(crate) fn worker_main_loop(core: Arc<Core>, worker_id: usize) {
    jprint::set_worker_id(worker_id as u32);
    let stats = &core.worker_stats[worker_id];
    stats.record_thread_id(current_thread_id());
    jdebug!("worker online");

    while let Some(index) = core.ready.pop_blocking() {
        core.run_job(index);
        stats.record_job();
    }

    jdebug!("worker exiting");
    jprint::clear_worker_id();
}

/// The scheduling service. Submissions hand over a runnable plus an
/// arguments blob by value and get back a completion handle.
pub struct Scheduler {
    core: Arc<Core>,
    workers: WorkerPool,
}

impl Scheduler {
    /// Validate the configuration, build the pools, and spawn the
    /// workers.
    pub fn new(config: SchedulerConfig) -> SchedResult<Scheduler> {
        config.validate()?;
        let core = Arc::new(Core::new(&config));
        let workers = WorkerPool::start(config.worker_count, Arc::clone(&core))?;
        jdebug!(
            "scheduler up: {} workers, ready {}, pool {}",
            config.worker_count,
            config.ready_queue_capacity,
            config.record_pool_capacity
        );
        Ok(Scheduler { core, workers })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.count()
    }

    /// Total jobs executed so far, summed across workers.
    pub fn jobs_executed(&self) -> u64 {
        self.core.worker_stats.iter().map(|s| s.jobs_executed()).sum()
    }

    /// Create a ready job. The record is fully initialized before its
    /// handle is enqueued.
    pub fn insert_ready(&self, runnable: Runnable, args: &Arguments) -> JobHandle {
        let core = &self.core;
        let Some(index) = core.pool.allocate_blocking(&core.shutdown) else {
            return JobHandle::invalid();
        };
        let rec = core.pool.record(index);
        let id = JobId::new(index, rec.generation());
        rec.set_body(runnable, *args);
        rec.store_pending(0);
        rec.set_state(JobState::Ready);
        if !core.ready.push(index) {
            // Shutdown raced the submission; reclaim the record.
            core.pool.release(index);
            return JobHandle::invalid();
        }
        JobHandle::bind(Arc::clone(core), id)
    }

    /// Create a ready job from a closure whose captures fit the
    /// Arguments blob.
    pub fn insert_ready_fn<F>(&self, f: F) -> JobHandle
    where
        F: Fn() + Copy + Send + 'static,
    {
        let (runnable, args) = adapt(f);
        self.insert_ready(runnable, &args)
    }

    /// Create ready jobs for a batch of runnables. The returned handle
    /// completes once every job in the batch has completed.
    ///
    /// `args` may be empty (no arguments), a single blob (shared by every
    /// runnable), or exactly one blob per runnable; anything else is a
    /// programming error.
    pub fn insert_ready_bulk(&self, runnables: &[Runnable], args: &[Arguments]) -> JobHandle {
        assert!(
            args.is_empty() || args.len() == 1 || args.len() == runnables.len(),
            "bulk arguments count must be 0, 1, or the runnable count"
        );
        let core = &self.core;
        let n = runnables.len();

        // One free-list transaction covers the batch and its trailer.
        let Some(indices) = core.pool.allocate_many(n + 1, &core.shutdown) else {
            return JobHandle::invalid();
        };

        let trailer = indices[n];
        let trec = core.pool.record(trailer);
        let tid = JobId::new(trailer, trec.generation());
        trec.set_body(noop_runnable, Arguments::zeroed());

        if n == 0 {
            trec.store_pending(0);
            trec.set_state(JobState::Ready);
            if !core.ready.push(trailer) {
                core.pool.release(trailer);
                return JobHandle::invalid();
            }
            return JobHandle::bind(Arc::clone(core), tid);
        }

        trec.store_pending(n as i32);
        trec.set_state(JobState::Blocked);

        for (i, &index) in indices[..n].iter().enumerate() {
            let rec = core.pool.record(index);
            let blob = match args.len() {
                0 => Arguments::zeroed(),
                1 => args[0],
                _ => args[i],
            };
            rec.set_body(runnables[i], blob);
            let attached = rec.try_push_successor(tid, rec.generation());
            debug_assert!(attached);
            rec.store_pending(0);
            rec.set_state(JobState::Ready);
            if !core.ready.push(index) {
                // Shutdown mid-batch: this child will never run. Strand
                // nothing on the trailer and recycle the child.
                core.pool.release(index);
                core.release_barrier(tid, 1);
            }
        }

        JobHandle::bind(Arc::clone(core), tid)
    }

    /// Create a job that will not run until its barriers release. The
    /// returned handle starts with a bias of one barrier so the job
    /// cannot start before wiring is complete; call
    /// [`release_barrier`](JobHandleBlocked::release_barrier) when done.
    pub fn insert_blocked(&self, runnable: Runnable, args: &Arguments) -> JobHandleBlocked {
        let core = &self.core;
        let Some(index) = core.pool.allocate_blocking(&core.shutdown) else {
            return JobHandleBlocked::invalid();
        };
        let rec = core.pool.record(index);
        let id = JobId::new(index, rec.generation());
        rec.set_body(runnable, *args);
        rec.store_pending(1);
        rec.set_state(JobState::Blocked);
        JobHandleBlocked::bind(Arc::clone(core), id)
    }

    /// Closure form of [`insert_blocked`](Scheduler::insert_blocked).
    pub fn insert_blocked_fn<F>(&self, f: F) -> JobHandleBlocked
    where
        F: Fn() + Copy + Send + 'static,
    {
        let (runnable, args) = adapt(f);
        self.insert_blocked(runnable, &args)
    }

    /// Create a job that runs only after every antecedent has completed.
    /// Antecedents that already retired count as complete immediately.
    pub fn insert_after(
        &self,
        runnable: Runnable,
        args: &Arguments,
        antecedents: &[JobHandle],
    ) -> JobHandle {
        let core = &self.core;
        let Some(index) = core.pool.allocate_blocking(&core.shutdown) else {
            return JobHandle::invalid();
        };
        let rec = core.pool.record(index);
        let id = JobId::new(index, rec.generation());
        rec.set_body(runnable, *args);

        // One pending unit per antecedent plus the wiring bias, so a
        // burst of antecedent retirements cannot enqueue the record
        // before it is fully wired.
        let k = antecedents.len() as i32;
        rec.store_pending(k + 1);
        rec.set_state(JobState::Blocked);

        let mut misses: u32 = 1; // the wiring bias
        for handle in antecedents {
            debug_assert!(handle.same_scheduler(core) || !handle.is_valid());
            if !core.try_attach_successor(handle.id(), id) {
                misses += 1;
            }
        }
        core.release_barrier(id, misses);

        JobHandle::bind(Arc::clone(core), id)
    }

    /// Closure form of [`insert_after`](Scheduler::insert_after).
    pub fn insert_after_fn<F>(&self, f: F, antecedents: &[JobHandle]) -> JobHandle
    where
        F: Fn() + Copy + Send + 'static,
    {
        let (runnable, args) = adapt(f);
        self.insert_after(runnable, &args, antecedents)
    }

    /// Stop the scheduler: queued-but-not-popped jobs never run, workers
    /// drain and exit, and the call returns once every worker has joined.
    /// It is the caller's responsibility to order shutdown after the last
    /// submission; racing submissions may spuriously return invalid
    /// handles.
    pub fn shutdown(mut self) {
        self.shutdown_now();
    }

    fn shutdown_now(&mut self) {
        self.core.shutdown.store(true, Ordering::SeqCst);
        self.core.ready.signal_shutdown();
        self.workers.join();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}
