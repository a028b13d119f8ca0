//! Sv32 memory management unit: TLB plus page table walker.

/// Sv32 page table walker.
pub mod ptw;

/// Direct-mapped translation lookaside buffer.
pub mod tlb;

use crate::common::constants::{PAGE_OFFSET_MASK, PAGE_SHIFT};
use crate::common::{AccessType, Trap};
use crate::core::arch::mode::PrivilegeMode;
use crate::soc::memory::PhysicalMemory;

use self::tlb::Tlb;

/// A successfully translated address. RAM-backed translations are cached in
/// the TLB by the caller; MMIO-backed ones never are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Translation {
    /// Falls within the hart's physical RAM region.
    Ram(u32),
    /// Falls outside RAM; must be routed through the MMIO dispatch table.
    Mmio(u32),
}

/// Sv32 address translator: owns the data and instruction TLBs.
pub struct Mmu {
    /// Data TLB for load/store address translation.
    pub dtlb: Tlb,
    /// Instruction TLB for fetch address translation.
    pub itlb: Tlb,
}

impl Mmu {
    /// Creates a new MMU with `tlb_size` entries in each of the two TLBs.
    pub fn new(tlb_size: usize) -> Self {
        Self {
            dtlb: Tlb::new(tlb_size),
            itlb: Tlb::new(tlb_size),
        }
    }

    /// Flushes both TLBs. Required on a root-page-table write, a
    /// translation-affecting privilege change, and SFENCE.VMA.
    pub fn flush(&mut self) {
        self.dtlb.flush();
        self.itlb.flush();
    }

    /// Translates `vaddr` for `access` at `effective_priv`.
    ///
    /// `effective_priv` is supplied by the caller rather than read from hart
    /// state: the instruction interpreter is responsible for substituting
    /// `status.MPRV`'s saved mode when machine-mode memory access overrides
    /// are in play. This unit has no opinion on MPRV.
    ///
    /// When `mmu_virtual` is false, translation is bypassed entirely (bare
    /// mode) and `vaddr` is returned unchanged, classified against `mem`.
    pub fn translate(
        &mut self,
        mem: &PhysicalMemory,
        vaddr: u32,
        access: AccessType,
        effective_priv: PrivilegeMode,
        mmu_virtual: bool,
        root_page_table: u32,
        status: u32,
    ) -> Result<Translation, Trap> {
        if !mmu_virtual || effective_priv == PrivilegeMode::Machine {
            return Ok(classify(mem, vaddr));
        }

        let vpn = vaddr >> PAGE_SHIFT;
        let tlb = if access == AccessType::Fetch {
            &self.itlb
        } else {
            &self.dtlb
        };

        if let Some(hit) = tlb.lookup(vpn) {
            check_tlb_permissions(&hit, access, effective_priv, status, vaddr)?;
            let offset_mask = if hit.huge { 0x3F_FFFF } else { PAGE_OFFSET_MASK };
            let paddr = (hit.ppn << PAGE_SHIFT) | (vaddr & offset_mask);
            return Ok(classify(mem, paddr));
        }

        let leaf = ptw::walk(mem, root_page_table, vaddr, access, effective_priv, status)?;

        let tlb = if access == AccessType::Fetch {
            &mut self.itlb
        } else {
            &mut self.dtlb
        };
        tlb.insert(vpn, leaf.ppn, leaf.huge, leaf.r, leaf.w, leaf.x, leaf.u);

        let offset_mask = if leaf.huge { 0x3F_FFFF } else { PAGE_OFFSET_MASK };
        let paddr = (leaf.ppn << PAGE_SHIFT) | (vaddr & offset_mask);
        Ok(classify(mem, paddr))
    }
}

fn classify(mem: &PhysicalMemory, paddr: u32) -> Translation {
    if mem.contains(paddr) {
        Translation::Ram(paddr)
    } else {
        Translation::Mmio(paddr)
    }
}

fn check_tlb_permissions(
    hit: &tlb::TlbHit,
    access: AccessType,
    privilege: PrivilegeMode,
    status: u32,
    vaddr: u32,
) -> Result<(), Trap> {
    const STATUS_SUM_BIT: u32 = 1 << 18;
    const STATUS_MXR_BIT: u32 = 1 << 19;
    let mxr = status & STATUS_MXR_BIT != 0;
    let sum = status & STATUS_SUM_BIT != 0;

    let allowed = match access {
        AccessType::Fetch => hit.x,
        AccessType::Write => hit.w,
        AccessType::Read => hit.r || (hit.x && mxr),
    };
    if !allowed {
        return Err(page_fault(vaddr, access));
    }
    match privilege {
        PrivilegeMode::User if !hit.u => Err(page_fault(vaddr, access)),
        PrivilegeMode::Supervisor if hit.u => {
            if !sum || access == AccessType::Fetch {
                Err(page_fault(vaddr, access))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

fn page_fault(vaddr: u32, access: AccessType) -> Trap {
    match access {
        AccessType::Fetch => Trap::InstructionPageFault(vaddr),
        AccessType::Read => Trap::LoadPageFault(vaddr),
        AccessType::Write => Trap::StorePageFault(vaddr),
    }
}
