//! Worker thread management
//!
//! Workers are OS threads that live for the scheduler's lifetime. Each
//! has a stats slot in a contiguous array so diagnostics can be read
//! without touching the threads themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jobsched_core::error::{SchedError, SchedResult};

use crate::scheduler::{worker_main_loop, Core};

/// Per-worker counters, written by the worker, read by anyone.
pub(crate) struct WorkerStats {
    thread_id: AtomicU64,
    jobs_executed: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        WorkerStats {
            thread_id: AtomicU64::new(0),
            jobs_executed: AtomicU64::new(0),
        }
    }

    pub fn record_thread_id(&self, id: u64) {
        self.thread_id.store(id, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn thread_id(&self) -> u64 {
        self.thread_id.load(Ordering::Relaxed)
    }

    pub fn record_job(&self) {
        self.jobs_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn jobs_executed(&self) -> u64 {
        self.jobs_executed.load(Ordering::Relaxed)
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// OS identity of the calling thread.
        pub(crate) fn current_thread_id() -> u64 {
            unsafe { libc::pthread_self() as u64 }
        }
    } else {
        pub(crate) fn current_thread_id() -> u64 {
            0
        }
    }
}

/// Pool of worker threads.
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` named workers over the shared core. On a spawn
    /// failure the already-started workers are shut down before the
    /// error is returned.
    pub fn start(count: usize, core: Arc<Core>) -> SchedResult<WorkerPool> {
        let mut handles = Vec::with_capacity(count);
        for worker_id in 0..count {
            let core_for_worker = Arc::clone(&core);
            let spawned = thread::Builder::new()
                .name(format!("jobsched-worker-{}", worker_id))
                .spawn(move || worker_main_loop(core_for_worker, worker_id));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(_) => {
                    core.ready.signal_shutdown();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SchedError::WorkerSpawnFailed);
                }
            }
        }
        Ok(WorkerPool { handles })
    }

    /// Number of workers started.
    #[inline]
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit its loop. Idempotent.
    pub fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
