//! A minimal OS-thread abstraction with an unceremonious kill primitive.
//!
//! Per the concurrency model, the IRQ pump thread is torn down by whatever
//! the platform calls "kill a thread" when the last hart is destroyed: no
//! cancellation token, no cooperative shutdown flag, no join. On Unix that
//! is `pthread_cancel`, so this wraps raw `pthread_t` handles directly
//! rather than `std::thread`, which offers no way to cancel a running
//! thread short of process exit.

use std::ffi::c_void;
use std::panic::AssertUnwindSafe;

/// A spawned OS thread that can be joined or forcibly killed.
#[derive(Debug)]
pub struct Thread {
    #[cfg(unix)]
    tid: libc::pthread_t,
    #[cfg(not(unix))]
    inner: Option<std::thread::JoinHandle<()>>,
}

// SAFETY: `pthread_t` is an opaque handle; all access goes through libc
// calls that are themselves thread-safe.
#[cfg(unix)]
unsafe impl Send for Thread {}

impl Thread {
    /// Spawns `f` on a new OS thread.
    #[cfg(unix)]
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        extern "C" fn trampoline(arg: *mut c_void) -> *mut c_void {
            // SAFETY: `arg` was produced by `Box::into_raw` below and is
            // passed exactly once.
            let closure = unsafe { Box::from_raw(arg.cast::<Box<dyn FnOnce() + Send>>()) };
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| closure()));
            std::ptr::null_mut()
        }

        let boxed: Box<Box<dyn FnOnce() + Send>> = Box::new(Box::new(f));
        let arg = Box::into_raw(boxed).cast::<c_void>();

        // SAFETY: `tid` is written by `pthread_create` before any other use.
        let mut tid: libc::pthread_t = unsafe { std::mem::zeroed() };
        // SAFETY: `trampoline` matches the required `extern "C"` signature
        // and takes ownership of `arg` exactly once.
        let rc = unsafe { libc::pthread_create(&mut tid, std::ptr::null(), trampoline, arg) };
        assert_eq!(rc, 0, "pthread_create failed");
        Self { tid }
    }

    /// Spawns `f` on a new OS thread (non-Unix fallback; [`Thread::kill`] is
    /// then a detach, not a true cancellation).
    #[cfg(not(unix))]
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            inner: Some(std::thread::spawn(f)),
        }
    }

    /// Blocks until the thread exits normally.
    #[cfg(unix)]
    pub fn join(self) {
        // SAFETY: `self.tid` was produced by a successful `pthread_create`.
        unsafe {
            libc::pthread_join(self.tid, std::ptr::null_mut());
        }
    }

    /// Blocks until the thread exits normally.
    #[cfg(not(unix))]
    pub fn join(mut self) {
        if let Some(handle) = self.inner.take() {
            let _ = handle.join();
        }
    }

    /// Unceremoniously terminates the thread at its next cancellation point
    /// (Unix: `pthread_cancel`). Callers must ensure the thread holds no
    /// locks and is not mid-MMIO-transaction when this is called, per the
    /// core's cancellation model.
    #[cfg(unix)]
    pub fn kill(self) {
        // SAFETY: `self.tid` was produced by a successful `pthread_create`;
        // cancellation of a detached-by-policy worker thread is safe as
        // long as it holds no resources that need unwinding, which the IRQ
        // pump thread does not.
        unsafe {
            libc::pthread_cancel(self.tid);
        }
    }

    /// Non-Unix fallback: there is no portable thread-kill, so this detaches
    /// the thread instead. It keeps running until the process exits.
    #[cfg(not(unix))]
    pub fn kill(mut self) {
        drop(self.inner.take());
    }
}
