//! A 32-bit RISC-V (Sv32) virtual machine core.
//!
//! This crate implements the subsystems that make a RISC-V VM a coherent
//! system, independent of any particular instruction decoder/executor:
//! 1. **Hart runtime** (`core::hart`): per-hart registers, CSR bank, trap and
//!    interrupt delivery with M/S delegation, and the cooperative run loop.
//! 2. **Memory subsystem** (`core::units::mmu`, `soc::memory`,
//!    `soc::interconnect`): flat physical RAM, a Sv32 page table walker, a
//!    direct-mapped TLB, and an MMIO dispatch table.
//! 3. **Devices** (`soc::devices`): a CLINT-style IPI/timer window and a
//!    sector-buffered ATA/IDE PIO storage controller.
//!
//! [`System`] ties these together: it owns the shared physical bus, the
//! global hart registry, and the IRQ pump thread, and is the entry point for
//! constructing harts with `System::create_vm`.
//!
//! Instruction decode and execution are out of scope for this crate; an
//! external decoder/executor drives a [`Hart`] through its run loop.

/// Common types and constants (addresses, registers, traps, access types).
pub mod common;
/// Construction-time configuration for a [`System`].
pub mod config;
/// Per-hart CPU state: registers, CSR bank, Sv32 MMU, trap delivery, run loop.
pub mod core;
/// System-on-chip: physical RAM, MMIO dispatch, devices, and the top-level [`System`].
pub mod soc;
/// Spinlock used to guard the global hart registry and the MMIO region table.
pub mod sync;
/// Minimal killable OS-thread abstraction (one per hart, one for the IRQ pump).
pub mod threading;

/// Root configuration type; use `Config::default()` or override fields directly.
pub use crate::config::Config;
/// One RISC-V hart: registers, CSR bank, Sv32 MMU, and the cooperative run loop.
pub use crate::core::Hart;
/// Top-level system: shared bus, hart registry, and IRQ pump. Construct with `System::new`.
pub use crate::soc::System;
