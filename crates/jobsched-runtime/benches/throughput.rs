//! Submission throughput benchmarks

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use jobsched_core::runnable::{Arguments, Runnable};
use jobsched_runtime::{Scheduler, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

fn bump_counter(args: &Arguments) {
    let counter = unsafe { &*(args.a0 as *const AtomicUsize) };
    counter.fetch_add(1, Ordering::Relaxed);
}

fn bench_submit_wait(c: &mut Criterion) {
    let sched = Scheduler::new(
        SchedulerConfig::new()
            .worker_count(4)
            .ready_queue_capacity(256)
            .record_pool_capacity(1024),
    )
    .unwrap();

    let counter = AtomicUsize::new(0);
    let args = Arguments::new(&counter as *const AtomicUsize as usize, 0, 0, 0);

    c.bench_function("insert_ready_wait", |b| {
        b.iter(|| {
            sched.insert_ready(bump_counter, &args).wait();
        })
    });

    let mut group = c.benchmark_group("burst");
    group.throughput(Throughput::Elements(100));
    group.bench_function("individual_100", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..100)
                .map(|_| sched.insert_ready(bump_counter, &args))
                .collect();
            for h in handles {
                h.wait();
            }
        })
    });
    group.bench_function("bulk_100", |b| {
        let runnables: Vec<Runnable> = vec![bump_counter; 100];
        let shared = [args];
        b.iter(|| {
            sched.insert_ready_bulk(&runnables, &shared).wait();
        })
    });
    group.finish();

    sched.shutdown();
}

criterion_group!(benches, bench_submit_wait);
criterion_main!(benches);
