//! # jobsched
//!
//! A concurrent job scheduler: hand it a short piece of work (a function
//! pointer plus a four-word arguments blob, or a small closure) and get
//! back a completion handle that can be waited on, polled, chained, or
//! used as a dependency of another job.
//!
//! Resources are bounded and chosen at initialization: a fixed worker
//! pool, a fixed record pool, and a fixed-capacity ready queue.
//! Exhaustion is absorbed as backpressure on the submitter rather than
//! surfaced as an error.
//!
//! ```no_run
//! use jobsched::{Scheduler, SchedulerConfig};
//!
//! let sched = Scheduler::new(
//!     SchedulerConfig::new()
//!         .worker_count(4)
//!         .ready_queue_capacity(64)
//!         .record_pool_capacity(256),
//! )
//! .unwrap();
//!
//! // A job gated on two others:
//! let a = sched.insert_ready_fn(|| { /* ... */ });
//! let b = sched.insert_ready_fn(|| { /* ... */ });
//! let after = sched.insert_after_fn(|| { /* ... */ }, &[a, b]);
//! after.wait();
//!
//! sched.shutdown();
//! ```

pub use jobsched_core::env;
pub use jobsched_core::jprint;
pub use jobsched_core::runnable::{adapt, noop_runnable, Arguments, Completion, Runnable};
pub use jobsched_core::{JobId, SchedError, SchedResult};

pub use jobsched_runtime::{JobHandle, JobHandleBlocked, Scheduler, SchedulerConfig};
