//! Sv32 page table walker.
//!
//! Sv32 is a two-level scheme: a 1024-entry root table covers 4 MiB per
//! entry, and each non-leaf root entry points at a 1024-entry leaf table
//! covering 4 KiB per entry. A root entry may itself be a leaf, in which
//! case it describes a 4 MiB superpage directly.
//!
//! Unlike the RV64 walkers this is adapted from, this walker does NOT set
//! the accessed/dirty bits on the guest's behalf: a PTE with A clear (or D
//! clear on a store) is a page fault here, full stop. The instruction
//! interpreter is expected to set those bits itself and retry, per the
//! core's external contract.

use crate::common::constants::{PAGE_SHIFT, VPN_INDEX_MASK};
use crate::common::{AccessType, Trap};
use crate::core::arch::mode::PrivilegeMode;
use crate::soc::memory::PhysicalMemory;

const PTE_V: u32 = 1 << 0;
const PTE_R: u32 = 1 << 1;
const PTE_W: u32 = 1 << 2;
const PTE_X: u32 = 1 << 3;
const PTE_U: u32 = 1 << 4;
const PTE_A: u32 = 1 << 6;
const PTE_D: u32 = 1 << 7;
const PTE_PPN_SHIFT: u32 = 10;
const SUPERPAGE_PPN0_MASK: u32 = 0x3FF;

/// A page table entry that named a leaf mapping (a translation, not a
/// pointer to the next level).
pub struct Leaf {
    /// Physical page number exactly as stored in the PTE (low 10 bits are
    /// zero for a 4 MiB superpage).
    pub ppn: u32,
    /// Whether this leaf was found at the root level (a 4 MiB superpage).
    pub huge: bool,
    pub r: bool,
    pub w: bool,
    pub x: bool,
    pub u: bool,
}

/// Walks the two-level Sv32 page table rooted at `root_page_table`,
/// checking permissions for `access` from `priv`.
///
/// Returns the matching leaf on success. `status` supplies `MXR`/`SUM`
/// (bits 19 and 18) for permission checks.
pub fn walk(
    mem: &PhysicalMemory,
    root_page_table: u32,
    vaddr: u32,
    access: AccessType,
    privilege: PrivilegeMode,
    status: u32,
) -> Result<Leaf, Trap> {
    let vpn1 = (vaddr >> (PAGE_SHIFT + 10)) & VPN_INDEX_MASK;
    let vpn0 = (vaddr >> PAGE_SHIFT) & VPN_INDEX_MASK;

    let root_pte_addr = root_page_table.wrapping_add(vpn1 * 4);
    let root_pte = read_pte(mem, root_pte_addr, vaddr, access)?;

    if !is_leaf(root_pte) {
        if root_pte & PTE_V == 0 {
            return Err(page_fault(vaddr, access));
        }
        let next_table = ((root_pte >> PTE_PPN_SHIFT) & 0x3F_FFFF) << PAGE_SHIFT;
        let leaf_pte_addr = next_table.wrapping_add(vpn0 * 4);
        let leaf_pte = read_pte(mem, leaf_pte_addr, vaddr, access)?;

        if !is_leaf(leaf_pte) {
            return Err(page_fault(vaddr, access));
        }
        check_access_dirty(leaf_pte, access, vaddr)?;
        check_permissions(leaf_pte, access, privilege, status, vaddr)?;

        return Ok(Leaf {
            ppn: (leaf_pte >> PTE_PPN_SHIFT) & 0x3F_FFFF,
            huge: false,
            r: leaf_pte & PTE_R != 0,
            w: leaf_pte & PTE_W != 0,
            x: leaf_pte & PTE_X != 0,
            u: leaf_pte & PTE_U != 0,
        });
    }

    let ppn = (root_pte >> PTE_PPN_SHIFT) & 0x3F_FFFF;
    if ppn & SUPERPAGE_PPN0_MASK != 0 {
        // Misaligned superpage: PPN0 must be all zero.
        return Err(page_fault(vaddr, access));
    }
    check_access_dirty(root_pte, access, vaddr)?;
    check_permissions(root_pte, access, privilege, status, vaddr)?;

    Ok(Leaf {
        ppn,
        huge: true,
        r: root_pte & PTE_R != 0,
        w: root_pte & PTE_W != 0,
        x: root_pte & PTE_X != 0,
        u: root_pte & PTE_U != 0,
    })
}

fn read_pte(mem: &PhysicalMemory, addr: u32, vaddr: u32, access: AccessType) -> Result<u32, Trap> {
    mem.read_u32(addr).ok_or_else(|| page_fault(vaddr, access))
}

fn is_leaf(pte: u32) -> bool {
    pte & PTE_V != 0 && (pte & (PTE_R | PTE_W | PTE_X)) != 0
}

fn check_access_dirty(pte: u32, access: AccessType, vaddr: u32) -> Result<(), Trap> {
    if pte & PTE_A == 0 {
        return Err(page_fault(vaddr, access));
    }
    if access == AccessType::Write && pte & PTE_D == 0 {
        return Err(page_fault(vaddr, access));
    }
    Ok(())
}

fn check_permissions(
    pte: u32,
    access: AccessType,
    privilege: PrivilegeMode,
    status: u32,
    vaddr: u32,
) -> Result<(), Trap> {
    const STATUS_SUM_BIT: u32 = 1 << 18;
    const STATUS_MXR_BIT: u32 = 1 << 19;

    let r = pte & PTE_R != 0;
    let w = pte & PTE_W != 0;
    let x = pte & PTE_X != 0;
    let u = pte & PTE_U != 0;
    let mxr = status & STATUS_MXR_BIT != 0;
    let sum = status & STATUS_SUM_BIT != 0;

    let allowed = match access {
        AccessType::Fetch => x,
        AccessType::Write => w,
        AccessType::Read => r || (x && mxr),
    };
    if !allowed {
        return Err(page_fault(vaddr, access));
    }

    match privilege {
        PrivilegeMode::User if !u => Err(page_fault(vaddr, access)),
        PrivilegeMode::Supervisor if u => {
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
