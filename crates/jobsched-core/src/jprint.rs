//! Leveled debug printing for the scheduler
//!
//! Thread-safe stderr logging with automatic worker/job context, in the
//! style of the kernel's printk. The runtime publishes the current worker
//! id and the job index being executed through thread-locals; every log
//! line carries them so interleaved worker output stays attributable.
//!
//! # Environment Variables
//!
//! - `JS_LOG_LEVEL=<level>` - 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `JS_FLUSH_EPRINT=1` - Flush stderr after each line
//! - `JS_PRINT_TIME=1` - Include nanosecond timestamp
//!
//! # Output Format
//!
//! `[LEVEL] [w<worker>:j<job>] message`, e.g. `[DEBUG] [w2:j17] retiring`.
//! Outside a worker the context prints as `[w--:j--]`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

use crate::env::env_get_bool;

/// Log levels, lowest to highest verbosity.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize logging from environment variables.
///
/// Called automatically on first use; may be called explicitly for
/// deterministic startup.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    START_TIME.get_or_init(Instant::now);
    FLUSH_ENABLED.store(env_get_bool("JS_FLUSH_EPRINT", false), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("JS_PRINT_TIME", false), Ordering::Relaxed);

    if let Ok(val) = std::env::var("JS_LOG_LEVEL") {
        let level = match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Warn,
        };
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

/// Get current log level.
#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically.
pub fn set_log_level(level: LogLevel) {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Check if a log level is enabled.
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

/// Elapsed nanoseconds since logging start.
#[inline]
pub fn elapsed_ns() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

// Context published by the runtime
thread_local! {
    static WORKER_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
    static JOB_INDEX: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Set current worker id for this thread (called by the runtime).
pub fn set_worker_id(id: u32) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

/// Clear worker id (called by the runtime on thread exit).
pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

/// Set the job index currently executing on this thread.
pub fn set_job_index(index: u32) {
    JOB_INDEX.with(|j| j.set(Some(index)));
}

/// Clear the job index (called when no job is running).
pub fn clear_job_index() {
    JOB_INDEX.with(|j| j.set(None));
}

/// Get current worker id, if this thread is a worker.
#[inline]
pub fn get_worker_id() -> Option<u32> {
    WORKER_ID.with(|w| w.get())
}

/// Get the job index currently executing on this thread.
#[inline]
pub fn get_job_index() -> Option<u32> {
    JOB_INDEX.with(|j| j.get())
}

fn write_context(out: &mut impl Write) {
    let _ = match get_worker_id() {
        Some(id) => write!(out, "[w{}:", id),
        None => write!(out, "[w--:"),
    };
    let _ = match get_job_index() {
        Some(idx) => write!(out, "j{}] ", idx),
        None => write!(out, "j--] "),
    };
}

/// Internal: leveled print with context.
#[doc(hidden)]
pub fn _jlog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();

    let _ = write!(handle, "{} ", level.prefix());
    if TIME_ENABLED.load(Ordering::Relaxed) {
        let _ = write!(handle, "[{}] ", elapsed_ns());
    }
    write_context(&mut handle);
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");

    if FLUSH_ENABLED.load(Ordering::Relaxed) {
        let _ = handle.flush();
    }
}

/// Error level log with context
#[macro_export]
macro_rules! jerror {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl(
            $crate::jprint::LogLevel::Error,
            format_args!($($arg)*)
        );
    }};
}

/// Warning level log with context
#[macro_export]
macro_rules! jwarn {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl(
            $crate::jprint::LogLevel::Warn,
            format_args!($($arg)*)
        );
    }};
}

/// Info level log with context
#[macro_export]
macro_rules! jinfo {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl(
            $crate::jprint::LogLevel::Info,
            format_args!($($arg)*)
        );
    }};
}

/// Debug level log with context
#[macro_export]
macro_rules! jdebug {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl(
            $crate::jprint::LogLevel::Debug,
            format_args!($($arg)*)
        );
    }};
}

/// Trace level log with context
#[macro_export]
macro_rules! jtrace {
    ($($arg:tt)*) => {{
        $crate::jprint::_jlog_impl(
            $crate::jprint::LogLevel::Trace,
            format_args!($($arg)*)
        );
    }};
}
