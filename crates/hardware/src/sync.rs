//! A minimal spinlock.
//!
//! The global hart registry is guarded by a spinlock rather than a
//! `std::sync::Mutex`: the critical sections it protects (registry
//! bookkeeping, MMIO table setup) are a handful of instructions, and the IRQ
//! pump thread takes the lock every 10 ms from a context where blocking on a
//! futex is needless overhead. This mirrors the original C implementation's
//! `spinlock_t`, built directly on `atomic_int` compare-and-swap rather than
//! a libc mutex.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A test-and-test-and-set spinlock around a `T`.
///
/// # Examples
///
/// ```ignore
/// let lock = SpinLock::new(0u32);
/// *lock.lock() += 1;
/// ```
pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is only ever granted through `lock()`, which
// holds `locked` for the lifetime of the returned guard.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new unlocked spinlock wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, busy-waiting until it is available.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
        SpinLockGuard { lock: self }
    }
}

/// RAII guard returned by [`SpinLock::lock`]; releases the lock on drop.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding the guard implies exclusive access to `data`.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: holding the guard implies exclusive access to `data`.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
