//! Free-running machine timer, driving `mtime`/`mtimecmp`-style interrupts.
//!
//! The timer is wall-clock based rather than cycle-counted: it converts
//! elapsed real time into ticks at a fixed frequency, matching the
//! original's 10 MHz default.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic tick counter with one comparator.
pub struct RvTimer {
    freq_hz: u64,
    start: Instant,
    compare: AtomicU64,
}

impl RvTimer {
    /// Creates a timer ticking at `freq_hz`, with the comparator initially
    /// unreachable (`u64::MAX`).
    pub fn new(freq_hz: u64) -> Self {
        Self {
            freq_hz,
            start: Instant::now(),
            compare: AtomicU64::new(u64::MAX),
        }
    }

    /// Current tick count since the timer was created.
    pub fn time(&self) -> u64 {
        let elapsed = self.start.elapsed().as_nanos();
        (elapsed * u128::from(self.freq_hz) / 1_000_000_000) as u64
    }

    /// Sets the comparator (`mtimecmp`-equivalent).
    pub fn set_compare(&self, compare: u64) {
        self.compare.store(compare, Ordering::Relaxed);
    }

    /// Returns the current comparator value.
    pub fn compare(&self) -> u64 {
        self.compare.load(Ordering::Relaxed)
    }

    /// Whether the timer has reached or passed its comparator.
    pub fn pending(&self) -> bool {
        self.time() >= self.compare()
    }
}
