//! Scheduler configuration

use jobsched_core::error::{SchedError, SchedResult};

/// Maximum workers (OS threads)
pub const MAX_WORKERS: usize = 64;

/// Default ready queue capacity
pub const DEFAULT_READY_QUEUE_CAPACITY: usize = 256;

/// Default record pool capacity
pub const DEFAULT_RECORD_POOL_CAPACITY: usize = 1024;

/// Configuration for the scheduler
///
/// Capacities are fixed for the scheduler's lifetime. Exhaustion is
/// absorbed as backpressure (submitters spin), so a ready queue or pool
/// sized too small for the workload can stall submission; size for the
/// peak number of concurrently live jobs, and note that dependency
/// trailers consume pool records too.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads to spawn
    pub worker_count: usize,

    /// Maximum concurrently-enqueued ready jobs
    pub ready_queue_capacity: usize,

    /// Maximum concurrently-live jobs across all states
    pub record_pool_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let num_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            worker_count: num_cpus.min(MAX_WORKERS),
            ready_queue_capacity: DEFAULT_READY_QUEUE_CAPACITY,
            record_pool_capacity: DEFAULT_RECORD_POOL_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of worker threads
    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n.min(MAX_WORKERS);
        self
    }

    /// Set the ready queue capacity
    pub fn ready_queue_capacity(mut self, n: usize) -> Self {
        self.ready_queue_capacity = n;
        self
    }

    /// Set the record pool capacity
    pub fn record_pool_capacity(mut self, n: usize) -> Self {
        self.record_pool_capacity = n;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> SchedResult<()> {
        if self.worker_count == 0 {
            return Err(SchedError::InvalidConfig("worker_count must be at least 1"));
        }
        if self.worker_count > MAX_WORKERS {
            return Err(SchedError::InvalidConfig("worker_count exceeds maximum"));
        }
        if self.ready_queue_capacity < self.worker_count {
            return Err(SchedError::InvalidConfig(
                "ready_queue_capacity must be at least worker_count",
            ));
        }
        if self.record_pool_capacity < self.ready_queue_capacity {
            return Err(SchedError::InvalidConfig(
                "record_pool_capacity must be at least ready_queue_capacity",
            ));
        }
        Ok(())
    }
}
