use riscv_core::core::units::mmu::tlb::Tlb;

#[test]
fn cold_tlb_misses_every_lookup() {
    let tlb = Tlb::new(64);
    for vpn in [0, 1, 0x1234, 0xFFFF_F] {
        assert!(tlb.lookup(vpn).is_none());
    }
}

#[test]
fn installed_entry_reports_the_permissions_it_was_given() {
    let mut tlb = Tlb::new(64);
    tlb.insert(0x10, 0x20, false, true, false, true, false);
    let hit = tlb.lookup(0x10).expect("should hit");
    assert_eq!(hit.ppn, 0x20);
    assert!(hit.r);
    assert!(!hit.w);
    assert!(hit.x);
    assert!(!hit.u);
    assert!(!hit.huge);
}

#[test]
fn direct_mapped_collision_evicts_the_prior_occupant() {
    let mut tlb = Tlb::new(16); // mask = 0xF, so vpn 0x1 and 0x11 collide
    tlb.insert(0x1, 0xAA, false, true, true, false, false);
    assert!(tlb.lookup(0x1).is_some());

    tlb.insert(0x11, 0xBB, false, true, true, false, false);
    assert!(tlb.lookup(0x1).is_none(), "colliding insert must evict the old tag");
    assert_eq!(tlb.lookup(0x11).expect("new entry present").ppn, 0xBB);
}

#[test]
fn flush_clears_both_regular_and_superpage_entries() {
    let mut tlb = Tlb::new(32);
    tlb.insert(0x5, 0x50, false, true, true, true, true);
    tlb.insert(0x2000, 0x3000, true, true, true, true, false);
    tlb.flush();
    assert!(tlb.lookup(0x5).is_none());
    assert!(tlb.lookup(0x2000).is_none());
}
