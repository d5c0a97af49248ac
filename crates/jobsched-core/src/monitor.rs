//! Monitor: a mutex paired with a condition variable
//!
//! Waiters may experience spurious wakeups and must recheck their
//! predicate; the `wait_while` helpers do that rechecking internally.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// A mutex and condition variable bundled around a value.
pub struct Monitor<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T> Monitor<T> {
    /// Create a monitor guarding the given value.
    pub fn new(value: T) -> Self {
        Monitor {
            state: Mutex::new(value),
            cond: Condvar::new(),
        }
    }

    /// Acquire the mutex.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap()
    }

    /// Wake one waiter.
    #[inline]
    pub fn notify_one(&self) {
        self.cond.notify_one();
    }

    /// Wake every waiter.
    #[inline]
    pub fn notify_all(&self) {
        self.cond.notify_all();
    }

    /// Block until `condition` returns false, releasing the mutex while
    /// waiting. Returns the reacquired guard.
    pub fn wait_while<'a, F>(
        &self,
        guard: MutexGuard<'a, T>,
        condition: F,
    ) -> MutexGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        self.cond.wait_while(guard, condition).unwrap()
    }

    /// Like [`wait_while`](Monitor::wait_while) with a deadline. The bool
    /// is true iff the wait gave up because the timeout expired (the
    /// condition may still hold).
    pub fn wait_timeout_while<'a, F>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
        condition: F,
    ) -> (MutexGuard<'a, T>, bool)
    where
        F: FnMut(&mut T) -> bool,
    {
        let (guard, result) = self
            .cond
            .wait_timeout_while(guard, timeout, condition)
            .unwrap();
        (guard, result.timed_out())
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Monitor::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_roundtrip() {
        let m = Monitor::new(0u32);
        {
            let mut guard = m.lock();
            *guard = 7;
        }
        assert_eq!(*m.lock(), 7);
    }

    #[test]
    fn test_wait_while_notify() {
        let m = Arc::new(Monitor::new(false));

        let m2 = Arc::clone(&m);
        let waiter = thread::spawn(move || {
            let guard = m2.lock();
            let guard = m2.wait_while(guard, |ready| !*ready);
            assert!(*guard);
        });

        // Give the waiter a chance to block, then release it
        thread::sleep(Duration::from_millis(10));
        {
            let mut guard = m.lock();
            *guard = true;
        }
        m.notify_all();

        waiter.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let m = Monitor::new(false);
        let guard = m.lock();
        let (guard, timed_out) =
            m.wait_timeout_while(guard, Duration::from_millis(20), |ready| !*ready);
        assert!(timed_out);
        assert!(!*guard);
    }

    #[test]
    fn test_wait_timeout_signalled() {
        let m = Arc::new(Monitor::new(false));

        let m2 = Arc::clone(&m);
        let signaller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            *m2.lock() = true;
            m2.notify_all();
        });

        let guard = m.lock();
        let (guard, timed_out) =
            m.wait_timeout_while(guard, Duration::from_secs(5), |ready| !*ready);
        assert!(!timed_out);
        assert!(*guard);

        signaller.join().unwrap();
    }
}
