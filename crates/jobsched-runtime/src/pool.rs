//! Fixed-size job record pool
//!
//! A slab of records plus a lock-free free list of indices. Allocation is
//! submitter backpressure: when the pool is dry the caller spins with
//! yield until a worker releases a record or shutdown is signalled.
//! Workers never allocate.
//!
//! Completion monitors are striped across the pool rather than allocated
//! per record; waiters on neighboring records share a monitor and recheck
//! their own done flag after every wake.

use core::sync::atomic::{AtomicBool, Ordering};

use crossbeam_queue::ArrayQueue;
use jobsched_core::Monitor;

use crate::record::JobRecord;

/// Number of completion monitors shared across the pool
const MONITOR_STRIPES: usize = 32;

pub(crate) struct RecordPool {
    records: Box<[JobRecord]>,
    free: ArrayQueue<u32>,
    monitors: Box<[Monitor<()>]>,
}

impl RecordPool {
    /// Create a pool of `capacity` free records.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        let records: Box<[JobRecord]> = (0..capacity).map(|_| JobRecord::new()).collect();

        let free = ArrayQueue::new(capacity);
        for index in 0..capacity as u32 {
            let _ = free.push(index);
        }

        let monitors: Box<[Monitor<()>]> = (0..capacity.min(MONITOR_STRIPES))
            .map(|_| Monitor::new(()))
            .collect();

        RecordPool {
            records,
            free,
            monitors,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn record(&self, index: u32) -> &JobRecord {
        &self.records[index as usize]
    }

    /// Completion monitor for the record at `index` (striped).
    #[inline]
    pub fn monitor_for(&self, index: u32) -> &Monitor<()> {
        &self.monitors[index as usize % self.monitors.len()]
    }

    /// Single allocation attempt. On success the record is Configuring.
    pub fn try_allocate(&self) -> Option<u32> {
        let index = self.free.pop()?;
        self.records[index as usize].begin_configuring();
        Some(index)
    }

    /// Allocate, spinning with yield on exhaustion. Returns `None` only
    /// once shutdown has been signalled.
    pub fn allocate_blocking(&self, shutdown: &AtomicBool) -> Option<u32> {
        loop {
            if let Some(index) = self.try_allocate() {
                return Some(index);
            }
            if shutdown.load(Ordering::SeqCst) {
                return None;
            }
            std::thread::yield_now();
        }
    }

    /// Allocate `n` records as one transaction, spinning with yield on
    /// exhaustion. Either all `n` are returned or (on shutdown) none;
    /// partial progress is rolled back.
    pub fn allocate_many(&self, n: usize, shutdown: &AtomicBool) -> Option<Vec<u32>> {
        assert!(
            n <= self.capacity(),
            "bulk allocation of {} records exceeds pool capacity {}",
            n,
            self.capacity()
        );

        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.try_allocate() {
                Some(index) => out.push(index),
                None => {
                    if shutdown.load(Ordering::SeqCst) {
                        for index in out {
                            self.records[index as usize].abandon_configuring();
                            let _ = self.free.push(index);
                        }
                        return None;
                    }
                    std::thread::yield_now();
                }
            }
        }
        Some(out)
    }

    /// Retire a record: advance its generation (stale ids now compare
    /// unequal), mark it Free, and return it to the free list.
    pub fn release(&self, index: u32) {
        let rec = &self.records[index as usize];
        rec.advance_generation();
        rec.set_state(jobsched_core::JobState::Free);
        let pushed = self.free.push(index).is_ok();
        debug_assert!(pushed, "free list overflow");
    }
}
