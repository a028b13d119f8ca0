use std::sync::atomic::Ordering;
use std::sync::Arc;

use riscv_core::common::constants::INTERRUPT_MTIMER;
use riscv_core::common::Trap;
use riscv_core::core::arch::PrivilegeMode;
use riscv_core::core::hart::{Hart, Interpreter};
use riscv_core::soc::{PhysicalBus, PhysicalMemory};

fn test_hart() -> Hart {
    let mem = PhysicalMemory::new(0x8000_0000, 16).expect("alloc test RAM");
    let bus = Arc::new(PhysicalBus::new(mem));
    Hart::new(0, bus, 16, 10_000_000)
}

struct ImmediateReturn;
impl Interpreter for ImmediateReturn {
    fn run_till_event(&mut self, _hart: &mut Hart) {}
}

#[test]
fn register_zero_always_reads_zero() {
    let mut hart = test_hart();
    hart.write_register(0, 0xDEAD_BEEF);
    assert_eq!(hart.read_register(0), 0);
    hart.write_register(5, 42);
    assert_eq!(hart.read_register(5), 42);
}

#[test]
fn exception_delegates_to_supervisor_when_armed_and_not_in_machine_mode() {
    let mut hart = test_hart();
    hart.set_priv_mode(PrivilegeMode::User);
    hart.pc = 0x8000_1000;
    hart.trap(Trap::IllegalInstruction(0xDEAD_BEEF));

    assert_eq!(hart.priv_mode, PrivilegeMode::Supervisor);
    let s = PrivilegeMode::Supervisor.to_u8() as usize;
    assert_eq!(hart.csr.epc[s], 0x8000_1000);
    assert_eq!(hart.csr.cause[s], riscv_core::common::constants::TRAP_ILL_INSTR);
    assert_eq!(hart.csr.tval[s], 0xDEAD_BEEF);
    assert!(hart.events.ev_trap.load(Ordering::Relaxed));
    assert_eq!(hart.events.wait_event.load(Ordering::Acquire), 0);
}

#[test]
fn exception_stays_in_machine_mode_when_already_there() {
    let mut hart = test_hart();
    hart.trap(Trap::Breakpoint(0x1234));
    assert_eq!(hart.priv_mode, PrivilegeMode::Machine);
    let m = PrivilegeMode::Machine.to_u8() as usize;
    assert_eq!(hart.csr.cause[m], riscv_core::common::constants::TRAP_BREAKPOINT);
}

#[test]
fn vectored_trap_jumps_to_base_plus_cause_times_four() {
    let mut hart = test_hart();
    hart.csr.tvec[PrivilegeMode::Machine.to_u8() as usize] = 0x8000_2000 | 1;
    hart.csr.cause[PrivilegeMode::Machine.to_u8() as usize] =
        riscv_core::common::constants::INTERRUPT_MASK | INTERRUPT_MTIMER;
    hart.trap_jump();
    assert_eq!(hart.pc, 0x8000_2000 + (INTERRUPT_MTIMER << 2));
}

#[test]
fn vectored_mode_synchronous_exception_still_jumps_to_flat_base() {
    let mut hart = test_hart();
    hart.csr.tvec[PrivilegeMode::Machine.to_u8() as usize] = 0x8000_2000 | 1;
    hart.csr.cause[PrivilegeMode::Machine.to_u8() as usize] =
        riscv_core::common::constants::TRAP_ILL_INSTR;
    hart.trap_jump();
    assert_eq!(hart.pc, 0x8000_2000);
}

#[test]
fn non_vectored_trap_jumps_to_flat_base() {
    let mut hart = test_hart();
    hart.csr.tvec[PrivilegeMode::Machine.to_u8() as usize] = 0x8000_3000;
    hart.csr.cause[PrivilegeMode::Machine.to_u8() as usize] =
        riscv_core::common::constants::TRAP_ILL_INSTR;
    hart.trap_jump();
    assert_eq!(hart.pc, 0x8000_3000);
}

#[test]
fn wfi_wakeup_advances_pc_and_flags_trap_jump() {
    let mut hart = test_hart();
    hart.pc = 0x8000_4000;
    hart.csr.ie = 1 << INTERRUPT_MTIMER;
    hart.csr.ip = 1 << INTERRUPT_MTIMER;

    assert!(hart.handle_ip(true));
    assert_eq!(hart.pc, 0x8000_4004);
    assert!(hart.events.ev_trap.load(Ordering::Relaxed));
    assert_eq!(hart.priv_mode, PrivilegeMode::Machine);
}

#[test]
fn disabled_interrupt_is_not_delivered() {
    let mut hart = test_hart();
    hart.csr.ip = 1 << INTERRUPT_MTIMER;
    hart.csr.ie = 0;
    assert!(!hart.handle_ip(false));
}

#[test]
fn run_one_event_jumps_on_pending_trap_flag() {
    let mut hart = test_hart();
    hart.csr.tvec[PrivilegeMode::Machine.to_u8() as usize] = 0x8000_5000;
    hart.events.ev_trap.store(true, Ordering::Relaxed);
    hart.run_one_event(&mut ImmediateReturn);
    assert_eq!(hart.pc, 0x8000_5000);
}

#[test]
fn run_one_event_folds_external_interrupt_and_jumps() {
    let mut hart = test_hart();
    hart.csr.tvec[PrivilegeMode::Machine.to_u8() as usize] = 0x8000_6000;
    hart.csr.ie = 1 << INTERRUPT_MTIMER;
    hart.timer.set_compare(0);
    hart.events.request_interrupt(1 << INTERRUPT_MTIMER);

    hart.run_one_event(&mut ImmediateReturn);

    assert_eq!(hart.pc, 0x8000_6000);
    assert_ne!(hart.csr.ip & (1 << INTERRUPT_MTIMER), 0);
}
