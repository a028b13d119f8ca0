//! RISC-V Sv32 and hart-state constants.
//!
//! Numbering for privilege levels, interrupt causes, and exception causes
//! follows the RISC-V Privileged Specification and matches the original
//! `riscv32.h` enum ordering exactly, since guest software branches on these
//! numeric values directly (CSR `mcause`/`scause` contents).

/// Page size in bytes (4 KiB, fixed by Sv32).
pub const PAGE_SIZE: u32 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u32 = 12;

/// Mask for the in-page byte offset.
pub const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

/// Number of bits per Sv32 page table index (10 bits per level, two levels).
pub const VPN_BITS_PER_LEVEL: u32 = 10;

/// Mask for a single 10-bit VPN index field.
pub const VPN_INDEX_MASK: u32 = 0x3FF;

/// Size of a Sv32 page table entry in bytes.
pub const PTE_SIZE: u32 = 4;

/// User privilege level.
pub const PRIVILEGE_USER: u8 = 0;
/// Supervisor privilege level.
pub const PRIVILEGE_SUPERVISOR: u8 = 1;
/// Hypervisor privilege level (unused; reserved slot in the `[4]`-indexed CSR arrays).
pub const PRIVILEGE_HYPERVISOR: u8 = 2;
/// Machine privilege level, the highest.
pub const PRIVILEGE_MACHINE: u8 = 3;

/// Set on a `cause` value to mark it as an interrupt rather than an exception.
pub const INTERRUPT_MASK: u32 = 0x8000_0000;

/// User software interrupt cause number.
pub const INTERRUPT_USOFTWARE: u32 = 0x0;
/// Supervisor software interrupt cause number.
pub const INTERRUPT_SSOFTWARE: u32 = 0x1;
/// Machine software interrupt cause number.
pub const INTERRUPT_MSOFTWARE: u32 = 0x3;
/// User timer interrupt cause number.
pub const INTERRUPT_UTIMER: u32 = 0x4;
/// Supervisor timer interrupt cause number.
pub const INTERRUPT_STIMER: u32 = 0x5;
/// Machine timer interrupt cause number.
pub const INTERRUPT_MTIMER: u32 = 0x7;
/// User external interrupt cause number.
pub const INTERRUPT_UEXTERNAL: u32 = 0x8;
/// Supervisor external interrupt cause number.
pub const INTERRUPT_SEXTERNAL: u32 = 0x9;
/// Machine external interrupt cause number.
pub const INTERRUPT_MEXTERNAL: u32 = 0xB;

/// Instruction address misaligned exception cause.
pub const TRAP_INSTR_MISALIGN: u32 = 0x0;
/// Instruction access fault exception cause.
pub const TRAP_INSTR_FETCH: u32 = 0x1;
/// Illegal instruction exception cause.
pub const TRAP_ILL_INSTR: u32 = 0x2;
/// Breakpoint exception cause.
pub const TRAP_BREAKPOINT: u32 = 0x3;
/// Load address misaligned exception cause.
pub const TRAP_LOAD_MISALIGN: u32 = 0x4;
/// Load access fault exception cause.
pub const TRAP_LOAD_FAULT: u32 = 0x5;
/// Store address misaligned exception cause.
pub const TRAP_STORE_MISALIGN: u32 = 0x6;
/// Store access fault exception cause.
pub const TRAP_STORE_FAULT: u32 = 0x7;
/// Environment call from user mode exception cause.
pub const TRAP_ENVCALL_UMODE: u32 = 0x8;
/// Environment call from supervisor mode exception cause.
pub const TRAP_ENVCALL_SMODE: u32 = 0x9;
/// Environment call from machine mode exception cause.
pub const TRAP_ENVCALL_MMODE: u32 = 0xB;
/// Instruction page fault exception cause.
pub const TRAP_INSTR_PAGEFAULT: u32 = 0xC;
/// Load page fault exception cause.
pub const TRAP_LOAD_PAGEFAULT: u32 = 0xD;
/// Store page fault exception cause.
pub const TRAP_STORE_PAGEFAULT: u32 = 0xF;

/// Number of general-purpose registers (x0..x31).
pub const GPR_COUNT: usize = 32;

/// Maximum number of harts the global registry can track.
pub const MAX_HARTS: usize = 256;

/// Maximum number of MMIO regions a single hart's dispatch table can hold.
pub const MAX_MMIO_REGIONS: usize = 256;

/// Default direct-mapped TLB entry count (always a power of two).
pub const TLB_SIZE: usize = 256;

/// Human-readable ABI names for general-purpose registers, indexed by register number.
pub const GP_REGISTER_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0/fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];
