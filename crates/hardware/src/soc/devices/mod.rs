//! Memory-mapped I/O devices.
//!
//! Two devices live here: the per-hart CLINT-style IPI/timer handler that
//! every hart cross-registers onto every other live hart, and the ATA/IDE
//! PIO storage controller.

/// Core Local Interruptor: software interrupt (IPI) and timer MMIO handler.
pub mod clint;

/// ATA/IDE PIO storage controller.
pub mod ata;

pub use ata::AtaController;
pub use clint::Clint;
