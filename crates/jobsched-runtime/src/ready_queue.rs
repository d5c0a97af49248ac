//! Bounded FIFO of jobs awaiting a worker
//!
//! A lock-based circular buffer under a monitor. Poppers (workers) block
//! on the monitor when empty; pushers never block on it. A full queue is
//! backpressure, absorbed by spinning with yield: pushers are either
//! workers releasing successors (which must not sleep on a queue they
//! also drain) or submitters (already rate-limited by pool exhaustion).
//!
//! Shutdown is one-way. Once signalled, every present and future
//! `pop_blocking` returns the termination sentinel even if items remain
//! queued; that is what keeps queued-but-not-popped jobs from running.

use std::collections::VecDeque;

use jobsched_core::Monitor;

struct QueueState {
    items: VecDeque<u32>,
    shutdown: bool,
}

pub(crate) struct ReadyQueue {
    monitor: Monitor<QueueState>,
    capacity: usize,
}

impl ReadyQueue {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        ReadyQueue {
            monitor: Monitor::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                shutdown: false,
            }),
            capacity,
        }
    }

    /// Enqueue a record index, spinning with yield while full.
    ///
    /// Returns false iff shutdown was signalled, in which case the item
    /// was not enqueued and will never run.
    pub fn push(&self, index: u32) -> bool {
        loop {
            {
                let mut state = self.monitor.lock();
                if state.shutdown {
                    return false;
                }
                if state.items.len() < self.capacity {
                    state.items.push_back(index);
                    drop(state);
                    self.monitor.notify_one();
                    return true;
                }
            }
            std::thread::yield_now();
        }
    }

    /// Dequeue the oldest index, blocking while empty. Returns `None`
    /// once shutdown has been signalled.
    pub fn pop_blocking(&self) -> Option<u32> {
        let guard = self.monitor.lock();
        let mut guard = self
            .monitor
            .wait_while(guard, |s| s.items.is_empty() && !s.shutdown);
        if guard.shutdown {
            return None;
        }
        guard.items.pop_front()
    }

    /// Signal termination: wakes every popper, present and future.
    pub fn signal_shutdown(&self) {
        {
            let mut state = self.monitor.lock();
            state.shutdown = true;
        }
        self.monitor.notify_all();
    }

    /// Approximate queue length, for diagnostics.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.monitor.lock().items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let q = ReadyQueue::new(8);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert_eq!(q.pop_blocking(), Some(1));
        assert_eq!(q.pop_blocking(), Some(2));
        assert_eq!(q.pop_blocking(), Some(3));
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let q = Arc::new(ReadyQueue::new(4));

        let q2 = Arc::clone(&q);
        let popper = thread::spawn(move || q2.pop_blocking());

        thread::sleep(Duration::from_millis(10));
        assert!(q.push(42));

        assert_eq!(popper.join().unwrap(), Some(42));
    }

    #[test]
    fn test_push_spins_while_full() {
        let q = Arc::new(ReadyQueue::new(1));
        assert!(q.push(1));

        let q2 = Arc::clone(&q);
        let pusher = thread::spawn(move || q2.push(2));

        // The pusher cannot complete until we make room
        thread::sleep(Duration::from_millis(10));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_blocking(), Some(1));

        assert!(pusher.join().unwrap());
        assert_eq!(q.pop_blocking(), Some(2));
    }

    #[test]
    fn test_shutdown_wakes_poppers() {
        let q = Arc::new(ReadyQueue::new(4));

        let mut poppers = vec![];
        for _ in 0..3 {
            let q = Arc::clone(&q);
            poppers.push(thread::spawn(move || q.pop_blocking()));
        }

        thread::sleep(Duration::from_millis(10));
        q.signal_shutdown();

        for p in poppers {
            assert_eq!(p.join().unwrap(), None);
        }
    }

    #[test]
    fn test_shutdown_overrides_queued_items() {
        let q = ReadyQueue::new(4);
        assert!(q.push(7));
        q.signal_shutdown();

        // Queued item stays queued; the sentinel wins
        assert_eq!(q.pop_blocking(), None);
        assert_eq!(q.pop_blocking(), None);

        // And pushes after shutdown are refused
        assert!(!q.push(8));
    }

    #[test]
    fn test_concurrent_producers_consumers() {
        let q = Arc::new(ReadyQueue::new(16));
        let produced = 4 * 500;

        let mut producers = vec![];
        for p in 0..4u32 {
            let q = Arc::clone(&q);
            producers.push(thread::spawn(move || {
                for i in 0..500u32 {
                    assert!(q.push(p * 500 + i));
                }
            }));
        }

        let mut consumers = vec![];
        for _ in 0..4 {
            let q = Arc::clone(&q);
            consumers.push(thread::spawn(move || {
                let mut got = vec![];
                while let Some(i) = q.pop_blocking() {
                    got.push(i);
                }
                got
            }));
        }

        for p in producers {
            p.join().unwrap();
        }
        // Let consumers drain, then terminate them
        while q.len() > 0 {
            thread::sleep(Duration::from_millis(1));
        }
        q.signal_shutdown();

        let mut all: Vec<u32> = vec![];
        for c in consumers {
            all.extend(c.join().unwrap());
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), produced);
    }
}
