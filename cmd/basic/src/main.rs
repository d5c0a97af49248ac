//! Basic jobsched example
//!
//! Demonstrates ready submission, blocked submission with barriers, and
//! dependency chaining.

use jobsched::{Scheduler, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

fn main() {
    println!("=== jobsched basic example ===\n");

    let sched = Scheduler::new(
        SchedulerConfig::new()
            .worker_count(4)
            .ready_queue_capacity(64)
            .record_pool_capacity(256),
    )
    .expect("scheduler init failed");

    // A plain ready job
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let h = sched.insert_ready_fn(|| {
        COUNTER.fetch_add(1, Ordering::SeqCst);
        println!("[job] ready job ran");
    });
    h.wait();
    println!("ready job done, counter = {}\n", COUNTER.load(Ordering::SeqCst));

    // A blocked job held behind three barriers
    let blocked = sched.insert_blocked_fn(|| {
        println!("[job] blocked job finally ran");
    });
    let mut barrier_args = jobsched::Arguments::zeroed();
    let release = blocked.add_barrier(&mut barrier_args, 3);
    blocked.release_barrier(1); // drop the submission bias

    println!("releasing three barriers...");
    for i in 1..=3 {
        println!("  release {} (done = {})", i, blocked.is_done());
        release(&barrier_args);
    }
    blocked.wait();
    println!("blocked job done\n");

    // A fan: three ready jobs, one dependent
    let fan: Vec<_> = (0..3)
        .map(|i| {
            sched.insert_ready_fn(move || {
                COUNTER.fetch_add(i + 1, Ordering::SeqCst);
            })
        })
        .collect();
    let after = sched.insert_after_fn(
        || println!("[job] dependent ran after the fan"),
        &fan,
    );
    after.wait();
    println!(
        "fan complete, counter = {}, jobs executed = {}",
        COUNTER.load(Ordering::SeqCst),
        sched.jobs_executed()
    );

    sched.shutdown();
    println!("\nscheduler shut down cleanly");
}
