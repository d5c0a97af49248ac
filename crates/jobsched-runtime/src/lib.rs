//! # jobsched-runtime
//!
//! The scheduling service: accepts short pieces of work, honors
//! dependencies between them, and distributes them across a fixed-size
//! worker pool.
//!
//! Jobs are records in a bounded pool; a bounded FIFO ready queue feeds
//! the workers; blocked jobs become ready when their pending barrier
//! count reaches zero. Exhaustion of either pool is backpressure on the
//! submitter, not an error.
//!
//! ## Modules
//!
//! - `config` - Scheduler sizing and validation
//! - `scheduler` - Submission APIs, barrier protocol, retirement, shutdown
//! - `handle` - Completion handles exposed to callers
//! - `pool` - Fixed-size record pool (internal)
//! - `ready_queue` - Bounded MPMC ready queue (internal)
//! - `record` - Per-job record state (internal)
//! - `worker` - Worker thread pool (internal)
//!
//! ## Example
//!
//! ```no_run
//! use jobsched_runtime::{Scheduler, SchedulerConfig};
//!
//! let sched = Scheduler::new(SchedulerConfig::default()).unwrap();
//! let h = sched.insert_ready_fn(|| {
//!     // runs on a worker thread
//! });
//! h.wait();
//! sched.shutdown();
//! ```

pub mod config;
pub mod handle;
pub mod scheduler;

mod pool;
mod ready_queue;
mod record;
mod worker;

// Re-exports for convenience
pub use config::SchedulerConfig;
pub use handle::{JobHandle, JobHandleBlocked};
pub use scheduler::Scheduler;
