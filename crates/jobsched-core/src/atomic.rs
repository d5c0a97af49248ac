//! Typed atomic helpers with a previous-value contract
//!
//! Thin wrappers over the std atomics. Every operation returns the value
//! the location held *before* the operation took effect; all "did I drive
//! the counter to zero" decisions in the scheduler depend on that contract.
//! All operations are sequentially consistent.

use core::sync::atomic::{
    AtomicI32, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

/// Atomic operations over a typed location, all returning the previous value.
pub trait AtomicPrimitive {
    type Value: Copy + Eq;

    /// If the location holds `comparand`, replace it with `replacement`.
    /// Returns the previous value either way; the swap happened iff the
    /// returned value equals `comparand`.
    fn compare_and_swap(&self, comparand: Self::Value, replacement: Self::Value) -> Self::Value;

    /// Add one; returns the previous value.
    fn fetch_increment(&self) -> Self::Value;

    /// Subtract one; returns the previous value.
    fn fetch_decrement(&self) -> Self::Value;

    /// Add `value`; returns the previous value.
    fn fetch_add_value(&self, value: Self::Value) -> Self::Value;

    /// Subtract `value`; returns the previous value.
    fn fetch_sub_value(&self, value: Self::Value) -> Self::Value;

    /// Sequentially consistent load.
    fn load_value(&self) -> Self::Value;

    /// Sequentially consistent store.
    fn store_value(&self, value: Self::Value);
}

macro_rules! atomic_primitive_impl {
    ($atomic:ty, $value:ty) => {
        impl AtomicPrimitive for $atomic {
            type Value = $value;

            #[inline]
            fn compare_and_swap(&self, comparand: $value, replacement: $value) -> $value {
                match self.compare_exchange(
                    comparand,
                    replacement,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(prev) => prev,
                    Err(prev) => prev,
                }
            }

            #[inline]
            fn fetch_increment(&self) -> $value {
                self.fetch_add(1, Ordering::SeqCst)
            }

            #[inline]
            fn fetch_decrement(&self) -> $value {
                self.fetch_sub(1, Ordering::SeqCst)
            }

            #[inline]
            fn fetch_add_value(&self, value: $value) -> $value {
                self.fetch_add(value, Ordering::SeqCst)
            }

            #[inline]
            fn fetch_sub_value(&self, value: $value) -> $value {
                self.fetch_sub(value, Ordering::SeqCst)
            }

            #[inline]
            fn load_value(&self) -> $value {
                self.load(Ordering::SeqCst)
            }

            #[inline]
            fn store_value(&self, value: $value) {
                self.store(value, Ordering::SeqCst)
            }
        }
    };
}

atomic_primitive_impl!(AtomicU32, u32);
atomic_primitive_impl!(AtomicI32, i32);
atomic_primitive_impl!(AtomicU64, u64);
atomic_primitive_impl!(AtomicI64, i64);
atomic_primitive_impl!(AtomicUsize, usize);

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "32")] {
        /// Two machine words treated as one atomic operand.
        ///
        /// Requires two-pointer alignment, which `AtomicU64` guarantees.
        pub type DoubleWord = u64;
        /// Atomic double-word location.
        pub type AtomicDoubleWord = AtomicU64;
    }
    // 64-bit targets have no stable 128-bit atomic; double-word operands
    // are only offered where the pointer size permits.
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_previous_value_contract() {
        let v = AtomicU32::new(10);
        assert_eq!(v.fetch_increment(), 10);
        assert_eq!(v.fetch_increment(), 11);
        assert_eq!(v.fetch_decrement(), 12);
        assert_eq!(v.fetch_add_value(5), 11);
        assert_eq!(v.fetch_sub_value(6), 16);
        assert_eq!(v.load_value(), 10);
    }

    #[test]
    fn test_cas_success_and_failure() {
        let v = AtomicU64::new(100);

        // Matching comparand: swap happens, previous value returned
        assert_eq!(AtomicPrimitive::compare_and_swap(&v, 100, 200), 100);
        assert_eq!(v.load_value(), 200);

        // Mismatched comparand: no swap, current value returned
        assert_eq!(AtomicPrimitive::compare_and_swap(&v, 100, 300), 200);
        assert_eq!(v.load_value(), 200);
    }

    #[test]
    fn test_signed_decrement_to_zero() {
        let v = AtomicI32::new(3);
        assert_eq!(v.fetch_decrement(), 3);
        assert_eq!(v.fetch_decrement(), 2);
        // Exactly one decrementer observes the 1 -> 0 transition
        assert_eq!(v.fetch_decrement(), 1);
        assert_eq!(v.load_value(), 0);
    }

    #[test]
    fn test_concurrent_increment() {
        let v = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..4 {
            let v = Arc::clone(&v);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    v.fetch_increment();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(v.load_value(), 4000);
    }

    #[test]
    fn test_final_decrement_observed_once() {
        let v = Arc::new(AtomicI32::new(64));
        let winners = Arc::new(AtomicU32::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let v = Arc::clone(&v);
            let winners = Arc::clone(&winners);
            handles.push(thread::spawn(move || {
                for _ in 0..8 {
                    if v.fetch_decrement() == 1 {
                        winners.fetch_increment();
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(v.load_value(), 0);
        assert_eq!(winners.load_value(), 1);
    }
}
