//! Stress test - saturate a small scheduler
//!
//! Pushes many more jobs than the pool can track at once, so submission
//! runs against backpressure the whole way.
//!
//! Environment:
//! - `JS_WORKERS` - worker count (default 8)
//! - `JS_POOL` - record pool capacity (default 64)

use jobsched::env::env_get;
use jobsched::{Arguments, Scheduler, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

fn bump_counter(args: &Arguments) {
    let counter = unsafe { &*(args.a0 as *const AtomicUsize) };
    counter.fetch_add(1, Ordering::Relaxed);
}

fn main() {
    let num_jobs: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let workers: usize = env_get("JS_WORKERS", 8);
    let pool: usize = env_get("JS_POOL", 64);

    println!("=== jobsched stress: {} jobs, {} workers, pool {} ===", num_jobs, workers, pool);

    let sched = Scheduler::new(
        SchedulerConfig::new()
            .worker_count(workers)
            .ready_queue_capacity(pool)
            .record_pool_capacity(pool),
    )
    .expect("scheduler init failed");

    let counter = AtomicUsize::new(0);
    let args = Arguments::new(&counter as *const AtomicUsize as usize, 0, 0, 0);

    let start = Instant::now();
    let mut last = jobsched::JobHandle::invalid();
    for _ in 0..num_jobs {
        last = sched.insert_ready(bump_counter, &args);
    }
    let submitted = start.elapsed();

    last.wait();
    while counter.load(Ordering::Relaxed) < num_jobs {
        std::thread::yield_now();
    }
    let total = start.elapsed();

    println!("submitted in {:?}, drained in {:?}", submitted, total);
    println!(
        "counter = {}, jobs executed = {}",
        counter.load(Ordering::Relaxed),
        sched.jobs_executed()
    );
    println!(
        "throughput: {:.0} jobs/sec",
        num_jobs as f64 / total.as_secs_f64()
    );

    sched.shutdown();
}
