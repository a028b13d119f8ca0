use riscv_core::core::arch::PrivilegeMode;
use riscv_core::core::hart::csr::CsrBank;

#[test]
fn new_bank_only_delegates_to_supervisor() {
    let csr = CsrBank::new(0);
    assert_eq!(csr.edeleg[PrivilegeMode::Supervisor.to_u8() as usize], 0xFFFF_FFFF);
    assert_eq!(csr.edeleg[PrivilegeMode::Machine.to_u8() as usize], 0);
    assert_eq!(csr.ideleg[PrivilegeMode::Supervisor.to_u8() as usize], 0xFFFF_FFFF);
    assert_eq!(csr.ideleg[PrivilegeMode::Machine.to_u8() as usize], 0);
}

#[test]
fn new_bank_carries_the_given_hart_id() {
    let csr = CsrBank::new(3);
    assert_eq!(csr.hartid, 3);
}

#[test]
fn new_bank_starts_with_no_pending_or_enabled_interrupts() {
    let csr = CsrBank::new(0);
    assert_eq!(csr.ie, 0);
    assert_eq!(csr.ip, 0);
    assert_eq!(csr.status, 0);
}
