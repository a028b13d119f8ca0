//! Per-hart IPI handler.
//!
//! Every hart cross-registers one of these, addressed under every other
//! live hart's MMIO table, so that any hart can raise a machine software
//! interrupt (an IPI) on any other by writing its MSIP register. This is
//! deliberately not a full CLINT: timer interrupts are posted directly by
//! the IRQ pump thread onto each hart's event state rather than through a
//! memory-mapped `mtime`/`mtimecmp` pair, so only the software-interrupt
//! register survives from the original device.

use crate::common::constants::INTERRUPT_MSOFTWARE;
use crate::common::AccessType;
use crate::core::hart::HartEvents;
use crate::soc::interconnect::MmioDevice;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Offset of the Machine Software Interrupt Pending register.
const MSIP_OFFSET: u32 = 0x0000;

/// A single-register IPI target, bound to one hart's event state.
pub struct Clint {
    target: Arc<HartEvents>,
    msip: AtomicU32,
}

impl Clint {
    /// Creates an IPI handler that raises `INTERRUPT_MSOFTWARE` on `target`
    /// whenever its MSIP register is written with bit 0 set.
    pub fn new(target: Arc<HartEvents>) -> Self {
        Self {
            target,
            msip: AtomicU32::new(0),
        }
    }
}

impl MmioDevice for Clint {
    fn access(&self, offset: u32, buf: &mut [u8], size: u8, access: AccessType) -> bool {
        if offset != MSIP_OFFSET || size != 4 || buf.len() != 4 {
            return false;
        }
        match access {
            AccessType::Read => {
                buf.copy_from_slice(&self.msip.load(Ordering::Relaxed).to_le_bytes());
                true
            }
            AccessType::Write => {
                let val = u32::from_le_bytes(buf.try_into().expect("checked len above")) & 1;
                self.msip.store(val, Ordering::Relaxed);
                if val != 0 {
                    self.target.request_interrupt(1 << INTERRUPT_MSOFTWARE);
                }
                true
            }
            AccessType::Fetch => false,
        }
    }
}
