use riscv_core::common::constants::{PAGE_SHIFT, VPN_INDEX_MASK};
use riscv_core::common::{AccessType, Trap};
use riscv_core::core::arch::PrivilegeMode;
use riscv_core::core::units::mmu::ptw::walk;
use riscv_core::soc::PhysicalMemory;

const PTE_V: u32 = 1 << 0;
const PTE_R: u32 = 1 << 1;
const PTE_W: u32 = 1 << 2;
const PTE_A: u32 = 1 << 6;
const PTE_D: u32 = 1 << 7;

fn write_leaf(mem: &PhysicalMemory, root: u32, vaddr: u32, ppn: u32, pte_extra: u32) {
    let vpn1 = (vaddr >> (PAGE_SHIFT + 10)) & VPN_INDEX_MASK;
    let vpn0 = (vaddr >> PAGE_SHIFT) & VPN_INDEX_MASK;
    let leaf_table = root + 0x1000;
    assert!(mem.write_u32(root + vpn1 * 4, ((leaf_table >> PAGE_SHIFT) << 10) | PTE_V));
    assert!(mem.write_u32(leaf_table + vpn0 * 4, (ppn << 10) | pte_extra));
}

#[test]
fn missing_root_pte_is_a_page_fault_for_the_access_kind() {
    let mem = PhysicalMemory::new(0, 16).expect("alloc test RAM");
    let err = walk(&mem, 0, 0x4000_0000, AccessType::Read, PrivilegeMode::Supervisor, 0).unwrap_err();
    assert_eq!(err, Trap::LoadPageFault(0x4000_0000));
}

#[test]
fn fetch_from_an_unmapped_address_is_an_instruction_page_fault() {
    let mem = PhysicalMemory::new(0, 16).expect("alloc test RAM");
    let err = walk(&mem, 0, 0x4000_0000, AccessType::Fetch, PrivilegeMode::User, 0).unwrap_err();
    assert_eq!(err, Trap::InstructionPageFault(0x4000_0000));
}

#[test]
fn clear_accessed_bit_is_a_page_fault_even_though_the_pte_is_valid_and_permitted() {
    let mem = PhysicalMemory::new(0, 16).expect("alloc test RAM");
    write_leaf(&mem, 0, 0x1000, 0x3, PTE_V | PTE_R | PTE_D);
    let err = walk(&mem, 0, 0x1000, AccessType::Read, PrivilegeMode::Supervisor, 0).unwrap_err();
    assert_eq!(err, Trap::LoadPageFault(0x1000));
}

#[test]
fn clear_dirty_bit_is_a_page_fault_only_on_store() {
    let mem = PhysicalMemory::new(0, 16).expect("alloc test RAM");
    write_leaf(&mem, 0, 0x1000, 0x3, PTE_V | PTE_R | PTE_W | PTE_A);

    let load = walk(&mem, 0, 0x1000, AccessType::Read, PrivilegeMode::Supervisor, 0);
    assert!(load.is_ok(), "a load does not require the dirty bit");

    let store = walk(&mem, 0, 0x1000, AccessType::Write, PrivilegeMode::Supervisor, 0).unwrap_err();
    assert_eq!(store, Trap::StorePageFault(0x1000));
}

#[test]
fn superpage_with_nonzero_low_ppn_bits_is_rejected() {
    let mem = PhysicalMemory::new(0, 16).expect("alloc test RAM");
    // A root-level leaf (superpage) whose PPN[0] field is nonzero is
    // architecturally misaligned and must fault rather than silently
    // truncate to a 4 KiB page.
    let misaligned_ppn = 0x401; // low 10 bits nonzero
    assert!(mem.write_u32(0, (misaligned_ppn << 10) | PTE_V | PTE_R | PTE_A | PTE_D));
    let err = walk(&mem, 0, 0x0, AccessType::Read, PrivilegeMode::Supervisor, 0).unwrap_err();
    assert_eq!(err, Trap::LoadPageFault(0x0));
}

#[test]
fn superpage_leaf_resolves_without_a_second_level_table() {
    let mem = PhysicalMemory::new(0, 4096).expect("alloc test RAM");
    let aligned_ppn = 0x400; // PPN[0] == 0, a valid 4 MiB-aligned superpage
    assert!(mem.write_u32(0, (aligned_ppn << 10) | PTE_V | PTE_R | PTE_W | PTE_A | PTE_D));
    let leaf = walk(&mem, 0, 0x10, AccessType::Write, PrivilegeMode::Supervisor, 0)
        .expect("superpage leaf should resolve directly");
    assert!(leaf.huge);
    assert_eq!(leaf.ppn, aligned_ppn);
}
