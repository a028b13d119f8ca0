//! Trap representation and host-facing construction errors.
//!
//! This module distinguishes two error surfaces:
//! 1. **`Trap`** — synchronous exceptions delivered in-band to the guest via
//!    [`crate::core::hart::Hart::trap`]. These are never returned as `Result`;
//!    raising one is how the emulated machine itself reports a fault.
//! 2. **Host errors** (`MemoryInitError`, `AtaInitError`) — failures that
//!    prevent construction of the emulator itself (allocation failure, a
//!    missing disk image). These use `thiserror` and propagate with `?`.

use std::fmt;

use super::constants::{
    TRAP_BREAKPOINT, TRAP_ENVCALL_MMODE, TRAP_ENVCALL_SMODE, TRAP_ENVCALL_UMODE, TRAP_ILL_INSTR,
    TRAP_INSTR_FETCH, TRAP_INSTR_MISALIGN, TRAP_INSTR_PAGEFAULT, TRAP_LOAD_FAULT,
    TRAP_LOAD_MISALIGN, TRAP_LOAD_PAGEFAULT, TRAP_STORE_FAULT, TRAP_STORE_MISALIGN,
    TRAP_STORE_PAGEFAULT,
};

/// A synchronous RISC-V exception, carrying its `mcause`/`scause` code and
/// the `tval` value that accompanies it.
///
/// Variants that the privileged spec defines without an associated faulting
/// value (the three environment calls) take no payload; their `tval` is 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Fetch from a misaligned program counter. Payload: the PC.
    InstructionAddressMisaligned(u32),
    /// Instruction fetch rejected by the MMU or MMIO dispatcher. Payload: the faulting address.
    InstructionAccessFault(u32),
    /// Instruction decode failed. Payload: the raw instruction word.
    IllegalInstruction(u32),
    /// `EBREAK` or a triggered watchpoint. Payload: the PC.
    Breakpoint(u32),
    /// Misaligned load address. Payload: the faulting address.
    LoadAddressMisaligned(u32),
    /// Load rejected by the MMU or MMIO dispatcher. Payload: the faulting address.
    LoadAccessFault(u32),
    /// Misaligned store address. Payload: the faulting address.
    StoreAddressMisaligned(u32),
    /// Store rejected by the MMU or MMIO dispatcher. Payload: the faulting address.
    StoreAccessFault(u32),
    /// `ECALL` executed in U-mode.
    EnvironmentCallFromUMode,
    /// `ECALL` executed in S-mode.
    EnvironmentCallFromSMode,
    /// `ECALL` executed in M-mode.
    EnvironmentCallFromMMode,
    /// Sv32 walk rejected an instruction fetch. Payload: the faulting virtual address.
    InstructionPageFault(u32),
    /// Sv32 walk rejected a load. Payload: the faulting virtual address.
    LoadPageFault(u32),
    /// Sv32 walk rejected a store. Payload: the faulting virtual address.
    StorePageFault(u32),
}

impl Trap {
    /// Returns the `mcause`/`scause` exception code for this trap.
    ///
    /// This is the raw code without the interrupt bit set — exceptions never
    /// carry [`crate::common::constants::INTERRUPT_MASK`].
    pub fn cause(&self) -> u32 {
        match self {
            Trap::InstructionAddressMisaligned(_) => TRAP_INSTR_MISALIGN,
            Trap::InstructionAccessFault(_) => TRAP_INSTR_FETCH,
            Trap::IllegalInstruction(_) => TRAP_ILL_INSTR,
            Trap::Breakpoint(_) => TRAP_BREAKPOINT,
            Trap::LoadAddressMisaligned(_) => TRAP_LOAD_MISALIGN,
            Trap::LoadAccessFault(_) => TRAP_LOAD_FAULT,
            Trap::StoreAddressMisaligned(_) => TRAP_STORE_MISALIGN,
            Trap::StoreAccessFault(_) => TRAP_STORE_FAULT,
            Trap::EnvironmentCallFromUMode => TRAP_ENVCALL_UMODE,
            Trap::EnvironmentCallFromSMode => TRAP_ENVCALL_SMODE,
            Trap::EnvironmentCallFromMMode => TRAP_ENVCALL_MMODE,
            Trap::InstructionPageFault(_) => TRAP_INSTR_PAGEFAULT,
            Trap::LoadPageFault(_) => TRAP_LOAD_PAGEFAULT,
            Trap::StorePageFault(_) => TRAP_STORE_PAGEFAULT,
        }
    }

    /// Returns the `mtval`/`stval` value that accompanies this trap.
    pub fn tval(&self) -> u32 {
        match self {
            Trap::InstructionAddressMisaligned(v)
            | Trap::InstructionAccessFault(v)
            | Trap::IllegalInstruction(v)
            | Trap::Breakpoint(v)
            | Trap::LoadAddressMisaligned(v)
            | Trap::LoadAccessFault(v)
            | Trap::StoreAddressMisaligned(v)
            | Trap::StoreAccessFault(v)
            | Trap::InstructionPageFault(v)
            | Trap::LoadPageFault(v)
            | Trap::StorePageFault(v) => *v,
            Trap::EnvironmentCallFromUMode
            | Trap::EnvironmentCallFromSMode
            | Trap::EnvironmentCallFromMMode => 0,
        }
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trap cause={:#x} tval={:#x}", self.cause(), self.tval())
    }
}

impl std::error::Error for Trap {}

/// Failure constructing a hart's physical memory region.
#[derive(Debug, thiserror::Error)]
pub enum MemoryInitError {
    /// The host refused to back a region of the requested size.
    #[error("failed to allocate {size} bytes of guest RAM")]
    Alloc {
        /// Requested size in bytes.
        size: usize,
    },
}

/// Failure constructing or registering a hart with [`crate::System::create_vm`].
#[derive(Debug, thiserror::Error)]
pub enum CreateVmError {
    /// `hartid` is at or beyond [`crate::common::constants::MAX_HARTS`].
    #[error("hart id {hartid} exceeds the registry limit of {limit}")]
    HartLimitExceeded {
        /// The rejected hart id.
        hartid: u32,
        /// The registry's capacity.
        limit: usize,
    },
    /// `hartid` is already registered.
    #[error("hart id {hartid} is already registered")]
    DuplicateHartId {
        /// The rejected hart id.
        hartid: u32,
    },
    /// Allocating the first hart's RAM failed.
    #[error(transparent)]
    Memory(#[from] MemoryInitError),
    /// The first hart's device init failed to open an ATA backing image.
    #[error(transparent)]
    Ata(#[from] AtaInitError),
}

/// Failure constructing the ATA/IDE controller.
#[derive(Debug, thiserror::Error)]
pub enum AtaInitError {
    /// Neither drive was given a backing image.
    #[error("ATA controller requires at least one drive image")]
    NoDrives,
    /// A backing image could not be opened or read.
    #[error("failed to open ATA drive image {path}: {source}")]
    Io {
        /// Path to the image that failed to open.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A backing image was present but contained zero sectors.
    #[error("ATA drive image {path} is empty")]
    Empty {
        /// Path to the empty image.
        path: String,
    },
}
