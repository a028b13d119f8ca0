//! Unit tests, one module per `src/` concern.

/// Tests for common types: traps and host-facing construction errors.
pub mod common;

/// Tests for [`riscv_core::Config`] defaults and derived addresses.
pub mod config;



/// Tests for the spinlock primitive.
pub mod sync;

/// Tests for the killable OS-thread abstraction.
pub mod threading;
