//! Core hart implementation.
//!
//! This module contains the per-hart architectural state, the trap and
//! interrupt delivery logic, the cooperative run loop, the global hart
//! registry, and the Sv32 memory management unit.

/// Architecture-specific components (privilege modes).
pub mod arch;

/// Per-hart state, trap delivery, the run loop, and the global hart registry.
pub mod hart;

/// Execution units (currently only the Sv32 MMU: TLB and page table walker).
pub mod units;

pub use self::hart::Hart;
