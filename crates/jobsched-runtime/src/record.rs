//! Job record: the per-job state owned by the pool
//!
//! A record carries everything the scheduler knows about one submitted
//! job. Records are recycled; the generation counter distinguishes the
//! current occupant from stale external ids. Live generations are always
//! even, and every release advances the counter by two.
//!
//! The successor and completion lists are guarded by record-local
//! spinlocks and carry a `drained` flag. Draining happens exactly once,
//! during retirement; an append that loses the race against the drain (or
//! that arrives with a stale generation) is refused, and the caller falls
//! back to acting immediately. That refusal is what linearizes
//! `insert_after` and completion chaining against retirement.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use jobsched_core::atomic::AtomicPrimitive;
use jobsched_core::runnable::{Arguments, Runnable};
use jobsched_core::spinlock::SpinLock;
use jobsched_core::{JobId, JobState};

struct JobBody {
    runnable: Option<Runnable>,
    args: Arguments,
}

struct SuccessorList {
    items: Vec<JobId>,
    drained: bool,
}

struct CompletionList {
    items: Vec<(Runnable, Arguments)>,
    drained: bool,
}

/// Pool-owned state of one job.
pub(crate) struct JobRecord {
    /// Even while live; advanced by two on every release
    generation: AtomicU32,
    state: AtomicU8,
    /// Pending barrier count; zero means eligible to run
    pending: AtomicI32,
    done: AtomicBool,
    body: SpinLock<JobBody>,
    successors: SpinLock<SuccessorList>,
    completions: SpinLock<CompletionList>,
}

impl JobRecord {
    pub fn new() -> Self {
        JobRecord {
            generation: AtomicU32::new(0),
            state: AtomicU8::new(JobState::Free as u8),
            pending: AtomicI32::new(0),
            done: AtomicBool::new(false),
            body: SpinLock::new(JobBody {
                runnable: None,
                args: Arguments::zeroed(),
            }),
            successors: SpinLock::new(SuccessorList {
                items: Vec::new(),
                drained: false,
            }),
            completions: SpinLock::new(CompletionList {
                items: Vec::new(),
                drained: false,
            }),
        }
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.load_value()
    }

    /// Advance the generation by two, keeping parity even. Called on
    /// release, before the record re-enters the free list, so stale ids
    /// compare unequal from that point on.
    #[inline]
    pub fn advance_generation(&self) {
        self.generation.fetch_add_value(2);
    }

    #[inline]
    pub fn state(&self) -> JobState {
        JobState::from(self.state.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn set_state(&self, state: JobState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Store the pending barrier count during configuration.
    #[inline]
    pub fn store_pending(&self, count: i32) {
        self.pending.store_value(count);
    }

    /// Add to the pending barrier count; returns the previous value.
    #[inline]
    pub fn add_pending(&self, count: i32) -> i32 {
        self.pending.fetch_add_value(count)
    }

    /// Subtract from the pending barrier count; returns the previous
    /// value. The caller that observes `previous == count` drove the
    /// counter to zero and owns the enqueue.
    #[inline]
    pub fn sub_pending(&self, count: i32) -> i32 {
        self.pending.fetch_sub_value(count)
    }

    /// Reset the record for a new occupant. Called with the record
    /// exclusively held (just popped from the free list).
    pub fn begin_configuring(&self) {
        debug_assert_eq!(self.state(), JobState::Free);
        self.done.store(false, Ordering::Release);
        self.pending.store_value(0);
        {
            let mut body = self.body.lock();
            body.runnable = None;
            body.args = Arguments::zeroed();
        }
        {
            let mut list = self.successors.lock();
            list.items.clear();
            list.drained = false;
        }
        {
            let mut list = self.completions.lock();
            list.items.clear();
            list.drained = false;
        }
        self.set_state(JobState::Configuring);
    }

    /// Roll an allocation back without having published a handle.
    pub fn abandon_configuring(&self) {
        debug_assert_eq!(self.state(), JobState::Configuring);
        self.set_state(JobState::Free);
    }

    pub fn set_body(&self, runnable: Runnable, args: Arguments) {
        let mut body = self.body.lock();
        body.runnable = Some(runnable);
        body.args = args;
    }

    /// Take the body for execution. The record must be Running.
    pub fn take_body(&self) -> (Runnable, Arguments) {
        let mut body = self.body.lock();
        let runnable = body.runnable.take().expect("job record has no body");
        (runnable, body.args)
    }

    /// Append a dependent to the successor list, refusing if the list was
    /// already drained or the record no longer carries `expected_gen`.
    pub fn try_push_successor(&self, dependent: JobId, expected_gen: u32) -> bool {
        let mut list = self.successors.lock();
        if list.drained || self.generation() != expected_gen {
            return false;
        }
        list.items.push(dependent);
        true
    }

    /// Snapshot and close the successor list. Called once, by the
    /// retiring worker.
    pub fn drain_successors(&self) -> Vec<JobId> {
        let mut list = self.successors.lock();
        debug_assert!(!list.drained);
        list.drained = true;
        core::mem::take(&mut list.items)
    }

    /// Append a completion runnable, refusing under the same rules as
    /// [`try_push_successor`](JobRecord::try_push_successor).
    pub fn try_push_completion(
        &self,
        runnable: Runnable,
        args: Arguments,
        expected_gen: u32,
    ) -> bool {
        let mut list = self.completions.lock();
        if list.drained || self.generation() != expected_gen {
            return false;
        }
        list.items.push((runnable, args));
        true
    }

    /// Snapshot and close the completion list, in insertion order.
    pub fn drain_completions(&self) -> Vec<(Runnable, Arguments)> {
        let mut list = self.completions.lock();
        debug_assert!(!list.drained);
        list.drained = true;
        core::mem::take(&mut list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsched_core::runnable::noop_runnable;

    #[test]
    fn test_new_record_is_free() {
        let rec = JobRecord::new();
        assert_eq!(rec.state(), JobState::Free);
        assert_eq!(rec.generation(), 0);
        assert!(!rec.is_done());
    }

    #[test]
    fn test_generation_advances_by_two() {
        let rec = JobRecord::new();
        rec.advance_generation();
        assert_eq!(rec.generation(), 2);
        rec.advance_generation();
        assert_eq!(rec.generation(), 4);
        // Parity stays even
        assert_eq!(rec.generation() % 2, 0);
    }

    #[test]
    fn test_pending_previous_values() {
        let rec = JobRecord::new();
        rec.store_pending(1);
        assert_eq!(rec.add_pending(5), 1);
        assert_eq!(rec.sub_pending(1), 6);
        assert_eq!(rec.sub_pending(5), 5);
    }

    #[test]
    fn test_body_round_trip() {
        let rec = JobRecord::new();
        rec.begin_configuring();
        rec.set_body(noop_runnable, Arguments::new(1, 2, 3, 4));
        let (_r, args) = rec.take_body();
        assert_eq!(args, Arguments::new(1, 2, 3, 4));
    }

    #[test]
    fn test_successor_append_then_drain() {
        let rec = JobRecord::new();
        rec.begin_configuring();

        assert!(rec.try_push_successor(JobId::new(5, 0), 0));
        assert!(rec.try_push_successor(JobId::new(6, 0), 0));

        let drained = rec.drain_successors();
        assert_eq!(drained, vec![JobId::new(5, 0), JobId::new(6, 0)]);

        // Post-drain appends are refused
        assert!(!rec.try_push_successor(JobId::new(7, 0), 0));
    }

    #[test]
    fn test_stale_generation_append_refused() {
        let rec = JobRecord::new();
        rec.begin_configuring();
        assert!(!rec.try_push_successor(JobId::new(5, 0), 2));
        assert!(!rec.try_push_completion(noop_runnable, Arguments::zeroed(), 2));
    }

    #[test]
    fn test_reconfigure_resets_lists() {
        let rec = JobRecord::new();
        rec.begin_configuring();
        assert!(rec.try_push_completion(noop_runnable, Arguments::zeroed(), 0));
        let _ = rec.drain_completions();
        rec.set_state(JobState::Free);
        rec.advance_generation();

        rec.begin_configuring();
        // Fresh occupant accepts appends again under the new generation
        assert!(rec.try_push_completion(noop_runnable, Arguments::zeroed(), 2));
    }
}
