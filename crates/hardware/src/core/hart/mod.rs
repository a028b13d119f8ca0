//! Per-hart state, trap and interrupt delivery, and the cooperative run loop.
//!
//! A [`Hart`] owns everything specific to one RISC-V core: its general
//! registers, CSR bank, Sv32 MMU, and the event state ([`HartEvents`]) that
//! lets other harts and the IRQ pump thread wake it without a shared
//! instruction interpreter or a blocking syscall. The interpreter itself
//! (decode/execute) is out of scope here; [`Interpreter`] is the seam it
//! plugs into.

/// CSR storage and the bit-field helpers trap delivery needs.
pub mod csr;

/// The machine timer interrupt source.
pub mod timer;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::common::constants::{GP_REGISTER_NAMES, GPR_COUNT, INTERRUPT_MTIMER};
use crate::common::{AccessType, Trap};
use crate::core::arch::mode::PrivilegeMode;
use crate::core::units::mmu::{Mmu, Translation};
use crate::soc::interconnect::PhysicalBus;

use self::csr::{bit_cut, bit_replace, CsrBank};
use self::timer::RvTimer;

/// The cross-thread wakeup and pending-event state for one hart.
///
/// This is the suspension gate the cooperative run loop polls: setting
/// `wait_event` to 0 is how another hart's IPI, the IRQ pump thread's timer
/// tick, or the hart's own trap delivery tells a parked
/// [`Hart::run_one_event`] call that there is work to do. No condition
/// variable or futex is involved; the run loop is expected to spin on this
/// itself (or, more commonly, return from a busy interpreter loop that polls
/// it between instructions).
#[derive(Debug, Default)]
pub struct HartEvents {
    /// Nonzero while the hart is between events and may keep running
    /// uninterrupted; set to 0 to request it stop at the next poll.
    pub wait_event: AtomicU32,
    /// Set when a synchronous trap was raised from inside the interpreter's
    /// `run_till_event` call, so the run loop knows to vector to the trap
    /// handler once control returns to it.
    pub ev_trap: AtomicBool,
    /// Set when an external interrupt source posted to `ev_int_mask` and
    /// the run loop has not yet folded it into `mip`.
    pub ev_int: AtomicBool,
    /// Accumulated external interrupt-pending bits not yet merged into the
    /// CSR `ip` register. Bits are only ever added here; the run loop is
    /// responsible for clearing the ones whose source condition clears
    /// (the machine timer is the only one that does).
    pub ev_int_mask: AtomicU32,
}

impl HartEvents {
    /// Creates event state for a hart that has not yet started running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts an external interrupt and wakes the hart.
    ///
    /// Used by IPI senders (the CLINT MMIO handler) and the IRQ pump thread
    /// for timer ticks. Racing writers are fine: missing a merge only
    /// delays the interrupt to the hart's next poll, and a spurious wakeup
    /// costs nothing but a wasted poll.
    pub fn request_interrupt(&self, mask: u32) {
        self.ev_int_mask.fetch_or(mask, Ordering::Relaxed);
        self.ev_int.store(true, Ordering::Relaxed);
        self.wait_event.store(0, Ordering::Release);
    }
}

/// The seam the instruction interpreter plugs into.
///
/// Implementations decode and execute guest instructions against `hart`
/// until `hart.events.wait_event` reaches 0 (another thread requested an
/// event, or the interpreter itself called [`Hart::trap`]), then return.
/// This crate does not implement instruction decode; it only defines the
/// contract the run loop drives.
pub trait Interpreter {
    /// Executes guest instructions against `hart` until an event is raised.
    fn run_till_event(&mut self, hart: &mut Hart);
}

/// One RISC-V hart: registers, CSRs, MMU, and a shared view of physical
/// memory and MMIO.
pub struct Hart {
    /// General-purpose registers `x1..x31` (`x0` is hardwired to zero and
    /// not stored).
    registers: [u32; GPR_COUNT],
    /// Program counter.
    pub pc: u32,
    /// CSR bank.
    pub csr: CsrBank,
    /// Sv32 translation unit (TLBs + page table walker).
    pub mmu: Mmu,
    /// Physical RAM and MMIO, shared with every other hart addressing the
    /// same bus.
    pub bus: Arc<PhysicalBus>,
    /// Root page table physical address (`satp`'s PPN field, shifted).
    pub root_page_table: u32,
    /// Whether Sv32 translation is enabled (`satp.MODE == 1`).
    pub mmu_virtual: bool,
    /// Current privilege mode.
    pub priv_mode: PrivilegeMode,
    /// Machine timer.
    pub timer: RvTimer,
    /// Cross-thread wakeup and pending-event state, shared so other harts'
    /// CLINT handlers and the IRQ pump thread can reach it without holding
    /// a reference to the whole hart.
    pub events: Arc<HartEvents>,
}

impl Hart {
    /// Creates a hart addressing `bus`, with its PC initialized to the
    /// bus's RAM base (where firmware/kernel images are conventionally
    /// loaded) and machine-mode delegation of every cause down to
    /// supervisor mode pre-armed.
    pub fn new(hartid: u32, bus: Arc<PhysicalBus>, tlb_size: usize, timer_freq_hz: u64) -> Self {
        let pc = bus.mem.begin();
        Self {
            registers: [0; GPR_COUNT],
            pc,
            csr: CsrBank::new(hartid),
            mmu: Mmu::new(tlb_size),
            bus,
            root_page_table: 0,
            mmu_virtual: false,
            priv_mode: PrivilegeMode::Machine,
            timer: RvTimer::new(timer_freq_hz),
            events: Arc::new(HartEvents::new()),
        }
    }

    /// Reads general register `reg`. Register 0 always reads as zero.
    pub fn read_register(&self, reg: usize) -> u32 {
        if reg == 0 {
            0
        } else {
            self.registers[reg]
        }
    }

    /// Writes general register `reg`. Writes to register 0 are discarded.
    pub fn write_register(&mut self, reg: usize, value: u32) {
        if reg != 0 {
            self.registers[reg] = value;
        }
    }

    /// Forces the current privilege mode, bypassing delegation. Used by the
    /// interpreter's `MRET`/`SRET` handling to restore the mode saved in
    /// `status.xPP`.
    pub fn set_priv_mode(&mut self, mode: PrivilegeMode) {
        self.priv_mode = mode;
    }

    /// Flushes both TLBs. Required after a root-page-table write, a
    /// privilege change affecting translation, and `SFENCE.VMA`.
    pub fn tlb_flush(&mut self) {
        self.mmu.flush();
    }

    /// Translates `vaddr` for `access`, substituting `effective_priv` for
    /// the current privilege mode (the interpreter's hook for `status.MPRV`
    /// overrides).
    pub fn translate(
        &mut self,
        vaddr: u32,
        access: AccessType,
        effective_priv: PrivilegeMode,
    ) -> Result<Translation, Trap> {
        self.mmu.translate(
            &self.bus.mem,
            vaddr,
            access,
            effective_priv,
            self.mmu_virtual,
            self.root_page_table,
            self.csr.status,
        )
    }

    /// Reads `buf.len()` bytes from physical address `addr` through the bus.
    pub fn phys_read(&self, addr: u32, buf: &mut [u8]) -> Result<(), Trap> {
        self.bus.read(addr, buf)
    }

    /// Writes `buf` to physical address `addr` through the bus.
    pub fn phys_write(&self, addr: u32, buf: &mut [u8]) -> Result<(), Trap> {
        self.bus.write(addr, buf)
    }

    /// Which privilege level a cause delegates to, given the current mode
    /// and a `[4]`-indexed delegation table.
    ///
    /// Only a direct machine-to-supervisor hop is modeled (matching
    /// [`CsrBank::new`]'s pre-armed delegation): a cause delegates to
    /// supervisor mode when the hart is not already in machine mode and
    /// `deleg[Supervisor]` has the cause's bit set; otherwise it is handled
    /// in machine mode.
    fn delegate_target(&self, deleg: &[u32; 4], cause: u32) -> PrivilegeMode {
        let s = PrivilegeMode::Supervisor.to_u8() as usize;
        if self.priv_mode != PrivilegeMode::Machine && cause < 32 && deleg[s] & (1 << cause) != 0 {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::Machine
        }
    }

    /// Commits a trap or interrupt delivery: saves `pc` to `xepc`, records
    /// `cause`/`tval`, stacks the privilege mode and interrupt-enable bit
    /// into `xPP`/`xPIE`, clears `xIE`, and switches to `target`.
    fn raise(&mut self, target: PrivilegeMode, cause: u32, tval: u32) {
        let idx = target.to_u8() as usize;
        self.csr.epc[idx] = self.pc;
        self.csr.cause[idx] = cause;
        self.csr.tval[idx] = tval;
        match target {
            PrivilegeMode::Machine => {
                self.csr.status = bit_replace(self.csr.status, 11, 2, self.priv_mode.to_u8() as u32);
                self.csr.status = bit_replace(self.csr.status, 7, 1, bit_cut(self.csr.status, 3, 1));
                self.csr.status &= !(1 << 3);
            }
            PrivilegeMode::Supervisor => {
                self.csr.status = bit_replace(self.csr.status, 8, 1, self.priv_mode.to_u8() as u32);
                self.csr.status = bit_replace(self.csr.status, 5, 1, bit_cut(self.csr.status, 1, 1));
                self.csr.status &= !(1 << 1);
            }
            PrivilegeMode::User => unreachable!("traps never delegate to user mode"),
        }
        self.priv_mode = target;
    }

    /// Raises a synchronous exception, to be vectored to once the
    /// interpreter's current `run_till_event` call returns.
    ///
    /// This is the guest-visible fault-reporting path: decode failures,
    /// MMU/MMIO rejections, `ECALL`, and `EBREAK` all go through here
    /// instead of ever surfacing as a host `Result`.
    pub fn trap(&mut self, trap: Trap) {
        let cause = trap.cause();
        let tval = trap.tval();
        let target = self.delegate_target(&self.csr.edeleg, cause);
        tracing::debug!(
            hartid = self.csr.hartid,
            from = %self.priv_mode,
            to = %target,
            cause,
            tval,
            "trap"
        );
        self.raise(target, cause, tval);
        self.events.ev_trap.store(true, Ordering::Relaxed);
        self.events.wait_event.store(0, Ordering::Release);
    }

    /// Commits delivery of a pending interrupt `cause` (without the
    /// [`crate::common::constants::INTERRUPT_MASK`] bit; callers pass the
    /// raw cause number). Internal: reached only through
    /// [`Hart::handle_ip`], which has already checked that the interrupt is
    /// enabled and permitted at the current privilege level.
    fn deliver_interrupt(&mut self, cause: u32) {
        let target = self.delegate_target(&self.csr.ideleg, cause);
        tracing::debug!(
            hartid = self.csr.hartid,
            from = %self.priv_mode,
            to = %target,
            cause,
            "interrupt"
        );
        self.raise(target, cause | crate::common::constants::INTERRUPT_MASK, 0);
    }

    /// Checks `csr.ip` for a pending, enabled, and currently-permitted
    /// interrupt, delivering the highest-priority one if found.
    ///
    /// `wfi` distinguishes the two call sites: the run loop calls this with
    /// `false` after folding external events into `ip`; a `WFI` instruction
    /// implementation calls it with `true` to ask whether it may resume,
    /// in which case a taken interrupt also advances `pc` past the `WFI`
    /// itself and flags the run loop to jump once `run_till_event` returns.
    ///
    /// Returns whether an interrupt was delivered.
    pub fn handle_ip(&mut self, wfi: bool) -> bool {
        if self.csr.ip == 0 {
            return false;
        }
        for i in (1..=11).rev() {
            let mask = 1u32 << i;
            if self.csr.ip & mask == 0 {
                continue;
            }
            let level = PrivilegeMode::from_u8((i & 3) as u8);
            let allowed = level > self.priv_mode
                || (level == self.priv_mode
                    && (self.csr.status & (1 << (level.to_u8())) != 0 || wfi));
            if self.csr.ie & mask != 0 && allowed {
                if wfi {
                    self.pc = self.pc.wrapping_add(4);
                    self.events.ev_trap.store(true, Ordering::Relaxed);
                }
                self.deliver_interrupt(i);
                return true;
            }
        }
        false
    }

    /// Computes the trap-entry PC from `tvec[priv_mode]`: a flat base, or,
    /// when bit 0 is set AND the pending cause is an interrupt, a base
    /// vectored by `cause << 2`. Synchronous exceptions always jump to the
    /// flat base regardless of `tvec`'s mode bit.
    pub fn trap_jump(&mut self) {
        let idx = self.priv_mode.to_u8() as usize;
        let tvec = self.csr.tvec[idx];
        let mut pc = tvec & !3;
        let raw_cause = self.csr.cause[idx];
        if tvec & 1 != 0 && raw_cause & crate::common::constants::INTERRUPT_MASK != 0 {
            let cause = raw_cause & !crate::common::constants::INTERRUPT_MASK;
            pc = pc.wrapping_add(cause << 2);
        }
        self.pc = pc;
    }

    /// Runs one cooperative scheduling quantum: lets `interpreter` execute
    /// until it raises an event, then either vectors a synchronous trap
    /// already delivered by [`Hart::trap`], or folds pending external
    /// interrupts into `ip` and delivers the highest-priority one that is
    /// enabled and permitted.
    pub fn run_one_event(&mut self, interpreter: &mut dyn Interpreter) {
        self.events.wait_event.store(1, Ordering::Release);
        interpreter.run_till_event(self);

        if self.events.ev_trap.swap(false, Ordering::Relaxed) {
            self.trap_jump();
        } else if self.events.ev_int.swap(false, Ordering::Relaxed) {
            let mask = self.events.ev_int_mask.swap(0, Ordering::Relaxed);
            self.csr.ip |= mask;
            if self.csr.ip & (1 << INTERRUPT_MTIMER) != 0 && !self.timer.pending() {
                self.csr.ip &= !(1 << INTERRUPT_MTIMER);
            }
            if self.handle_ip(false) {
                self.trap_jump();
            }
        }
    }

    /// Drives [`Hart::run_one_event`] forever. Meant to be the body of the
    /// hart's dedicated OS thread; the only way out is for that thread to
    /// be killed (see [`crate::threading::Thread::kill`]) since the loop
    /// itself never checks for a shutdown request.
    pub fn run_forever(&mut self, interpreter: &mut dyn Interpreter) {
        loop {
            self.run_one_event(interpreter);
        }
    }

    /// Logs every general register and the PC at `tracing::debug!` level,
    /// replacing the original's `printf`-based register dump.
    pub fn dump_registers(&self) {
        for (i, name) in GP_REGISTER_NAMES.iter().enumerate() {
            tracing::debug!(reg = name, value = %format!("{:#010x}", self.read_register(i)));
        }
        tracing::debug!(reg = "pc", value = %format!("{:#010x}", self.pc));
    }
}
