use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use riscv_core::common::constants::MAX_MMIO_REGIONS;
use riscv_core::common::{AccessType, Trap};
use riscv_core::soc::interconnect::MmioHandle;
use riscv_core::soc::{MmioDevice, MmioRegions, PhysicalBus, PhysicalMemory};

fn device(fail: bool) -> (MmioHandle, Arc<AtomicU32>) {
    let last_offset = Arc::new(AtomicU32::new(0));
    let dev = Arc::new(EchoDeviceHandle {
        last_offset: Arc::clone(&last_offset),
        fail,
    });
    (dev, last_offset)
}

struct EchoDeviceHandle {
    last_offset: Arc<AtomicU32>,
    fail: bool,
}

impl MmioDevice for EchoDeviceHandle {
    fn access(&self, offset: u32, buf: &mut [u8], _size: u8, _access: AccessType) -> bool {
        self.last_offset.store(offset, Ordering::Relaxed);
        if self.fail {
            return false;
        }
        buf.fill(0x7E);
        true
    }
}

#[test]
fn dispatch_normalizes_the_offset_relative_to_the_region_base() {
    let mem = PhysicalMemory::new(0x8000_0000, 1).expect("alloc test RAM");
    let bus = PhysicalBus::new(mem);
    let (dev, last_offset) = device(false);
    assert!(bus.add_mmio(0x2000, 0x2100, dev));

    let mut buf = [0u8; 1];
    bus.read(0x2040, &mut buf).expect("region should claim this address");
    assert_eq!(last_offset.load(Ordering::Relaxed), 0x40);
    assert_eq!(buf[0], 0x7E);
}

#[test]
fn handler_returning_false_is_an_access_fault_with_the_unnormalized_address() {
    let mem = PhysicalMemory::new(0x8000_0000, 1).expect("alloc test RAM");
    let bus = PhysicalBus::new(mem);
    let (dev, _) = device(true);
    assert!(bus.add_mmio(0x2000, 0x2100, dev));

    let mut buf = [0u8; 1];
    let err = bus.read(0x2040, &mut buf).unwrap_err();
    assert_eq!(err, Trap::LoadAccessFault(0x2040));

    let mut wbuf = [0u8; 1];
    let err = bus.write(0x2040, &mut wbuf).unwrap_err();
    assert_eq!(err, Trap::StoreAccessFault(0x2040));
}

#[test]
fn table_rejects_overlapping_regions_but_accepts_adjacent_ones() {
    let mut regions = MmioRegions::new();
    let (a, _) = device(false);
    let (b, _) = device(false);
    let (c, _) = device(false);
    assert!(regions.add(0x1000, 0x2000, a));
    assert!(!regions.add(0x1FFF, 0x2100, b), "overlaps the end of the first region by one byte");
    assert!(regions.add(0x2000, 0x3000, c), "adjacent, non-overlapping regions are fine");
}

#[test]
fn table_caps_out_at_max_mmio_regions() {
    let mut regions = MmioRegions::new();
    for i in 0..MAX_MMIO_REGIONS {
        let base = (i as u32) * 0x10;
        let (dev, _) = device(false);
        assert!(regions.add(base, base + 0x8, dev), "region {i} should fit under the cap");
    }
    let (overflow, _) = device(false);
    let next_base = (MAX_MMIO_REGIONS as u32) * 0x10;
    assert!(!regions.add(next_base, next_base + 0x8, overflow));
}

#[test]
fn remove_drops_the_named_region_and_later_accesses_fault() {
    let mem = PhysicalMemory::new(0x8000_0000, 1).expect("alloc test RAM");
    let bus = PhysicalBus::new(mem);
    let (dev, _) = device(false);
    assert!(bus.add_mmio(0x2000, 0x2100, dev));
    assert!(bus.remove_mmio(0x2000));
    assert!(!bus.remove_mmio(0x2000), "second remove of the same base is a no-op");

    let mut buf = [0u8; 1];
    assert_eq!(bus.read(0x2040, &mut buf), Err(Trap::LoadAccessFault(0x2040)));
}
