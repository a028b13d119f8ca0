//! MMIO region table and physical address dispatch.
//!
//! Below the translator, a hart's physical address space is RAM plus a flat
//! table of at most [`MAX_MMIO_REGIONS`] non-overlapping windows, each
//! backed by a device handler. Routing is the policy from the original
//! dispatcher: addresses inside RAM go straight to the byte array; anything
//! else is a linear scan of the table, normalizing the address to an
//! offset from the region's base before calling the handler.

use std::sync::Arc;

use crate::common::constants::MAX_MMIO_REGIONS;
use crate::common::{AccessType, Trap};
use crate::soc::memory::PhysicalMemory;
use crate::sync::SpinLock;

/// A memory-mapped device reachable through the MMIO dispatch table.
///
/// `access` mirrors the external handler contract: `offset` is already
/// normalized relative to the region's base address. Implementations must
/// be safe to call concurrently from any hart the region is registered on.
pub trait MmioDevice: Send + Sync {
    /// Services one access. Returns `false` to signal an access fault,
    /// which the dispatcher reports to the guest with the original
    /// (un-normalized) address as `tval`.
    fn access(&self, offset: u32, buf: &mut [u8], size: u8, access: AccessType) -> bool;
}

/// Shared handle to a registered device, clonable so the same device
/// instance can be registered in more than one hart's table (as CLINT is,
/// for cross-hart IPI delivery).
pub type MmioHandle = Arc<dyn MmioDevice>;

struct Region {
    base: u32,
    end: u32,
    handler: MmioHandle,
}

/// Ordered, non-overlapping table of MMIO windows.
pub struct MmioRegions {
    regions: Vec<Region>,
}

impl Default for MmioRegions {
    fn default() -> Self {
        Self::new()
    }
}

impl MmioRegions {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Registers `[base, end)` against `handler`.
    ///
    /// Returns `false` without modifying the table if the table is already
    /// at [`MAX_MMIO_REGIONS`] or the new window overlaps an existing one.
    pub fn add(&mut self, base: u32, end: u32, handler: MmioHandle) -> bool {
        if self.regions.len() >= MAX_MMIO_REGIONS {
            return false;
        }
        if self.regions.iter().any(|r| base < r.end && r.base < end) {
            return false;
        }
        self.regions.push(Region { base, end, handler });
        true
    }

    /// Deregisters the region starting at `base`, if any.
    pub fn remove(&mut self, base: u32) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.base != base);
        self.regions.len() != before
    }

    fn find(&self, addr: u32) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| addr >= r.base && addr < r.end)
    }

    /// Dispatches a read of `size` bytes at `addr` into `buf`, or `None` if
    /// no region claims the address.
    pub fn read(&self, addr: u32, buf: &mut [u8], size: u8) -> Option<bool> {
        let region = self.find(addr)?;
        Some(region.handler.access(addr - region.base, buf, size, AccessType::Read))
    }

    /// Dispatches a write of `size` bytes at `addr` from `buf`, or `None` if
    /// no region claims the address.
    pub fn write(&self, addr: u32, buf: &mut [u8], size: u8) -> Option<bool> {
        let region = self.find(addr)?;
        Some(region.handler.access(addr - region.base, buf, size, AccessType::Write))
    }
}

/// Combines RAM and the MMIO table into the single routing policy described
/// by the core's physical-access contract: `phys_read`/`phys_write`.
///
/// The MMIO table is spinlock-guarded rather than taken by `&mut self`, so a
/// `PhysicalBus` can be wrapped in a plain `Arc` and shared read/write across
/// every hart that addresses it, with `add_mmio`/`remove_mmio` available to
/// any of them at any time (device attach/detach is rare next to the
/// load/store hot path, which never needs the lock).
pub struct PhysicalBus {
    /// The hart's flat physical RAM region.
    pub mem: PhysicalMemory,
    mmio: SpinLock<MmioRegions>,
}

impl PhysicalBus {
    /// Creates a bus over `mem` with an empty MMIO table.
    pub fn new(mem: PhysicalMemory) -> Self {
        Self {
            mem,
            mmio: SpinLock::new(MmioRegions::new()),
        }
    }

    /// Registers `[base, end)` against `handler`. See [`MmioRegions::add`].
    pub fn add_mmio(&self, base: u32, end: u32, handler: MmioHandle) -> bool {
        self.mmio.lock().add(base, end, handler)
    }

    /// Deregisters the region starting at `base`, if any.
    pub fn remove_mmio(&self, base: u32) -> bool {
        self.mmio.lock().remove(base)
    }

    /// Reads `buf.len()` bytes (1, 2, or 4) from guest physical address
    /// `addr`. RAM is read directly; anything else goes through the MMIO
    /// table. A handler returning `false`, or no claiming region, is
    /// reported as a load access fault carrying `addr` as `tval`.
    pub fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), Trap> {
        if self.mem.contains_range(addr, buf.len() as u32) {
            return if self.mem.read_bytes(addr, buf) {
                Ok(())
            } else {
                Err(Trap::LoadAccessFault(addr))
            };
        }
        match self.mmio.lock().read(addr, buf, buf.len() as u8) {
            Some(true) => Ok(()),
            Some(false) | None => Err(Trap::LoadAccessFault(addr)),
        }
    }

    /// Writes `buf` to guest physical address `addr`. Same routing policy
    /// as [`PhysicalBus::read`]; failures are reported as store access
    /// faults.
    pub fn write(&self, addr: u32, buf: &mut [u8]) -> Result<(), Trap> {
        if self.mem.contains_range(addr, buf.len() as u32) {
            return if self.mem.write_bytes(addr, buf) {
                Ok(())
            } else {
                Err(Trap::StoreAccessFault(addr))
            };
        }
        match self.mmio.lock().write(addr, buf, buf.len() as u8) {
            Some(true) => Ok(()),
            Some(false) | None => Err(Trap::StoreAccessFault(addr)),
        }
    }
}
