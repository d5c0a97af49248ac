//! # jobsched-core
//!
//! Core types and primitives for the jobsched concurrent job scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code; the
//! scheduling service itself lives in `jobsched-runtime`.
//!
//! ## Modules
//!
//! - `id` - Job identifier type (pool index + generation)
//! - `state` - Job lifecycle states
//! - `runnable` - Runnable/Arguments model and closure adaptation
//! - `atomic` - Typed atomic helpers with a previous-value contract
//! - `monitor` - Mutex + condition variable bundle
//! - `spinlock` - Internal spinlock primitive
//! - `error` - Error types
//! - `jprint` - Leveled debug printing macros
//! - `env` - Environment variable utilities

pub mod atomic;
pub mod env;
pub mod error;
pub mod id;
pub mod jprint;
pub mod monitor;
pub mod runnable;
pub mod spinlock;
pub mod state;

// Re-exports for convenience
pub use atomic::AtomicPrimitive;
pub use error::{SchedError, SchedResult};
pub use id::JobId;
pub use monitor::Monitor;
pub use runnable::{adapt, noop_runnable, Arguments, Completion, Runnable, ARGUMENT_WORDS};
pub use spinlock::SpinLock;
pub use state::JobState;
