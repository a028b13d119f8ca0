//! Global hart registry and IRQ pump thread.
//!
//! [`System`] is an explicit value rather than a set of process globals: the
//! hart registry, the pump thread handle, and the shared physical bus all
//! live here, and [`System::create_vm`] takes a handle rather than reaching
//! for hidden statics.
//!
//! Harts share one [`PhysicalBus`] regardless of how many are registered, so
//! registering a per-hart CLINT region collapses to registering it once on
//! that shared bus: every hart already addresses the same MMIO table, so a
//! region added for hart `n` is immediately reachable from hart `n-1`, hart
//! `0`, or any hart created afterward. The pump thread's only job is posting
//! the timer tick to every registered hart each sweep.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::common::constants::{INTERRUPT_MTIMER, MAX_HARTS};
use crate::common::{CreateVmError, MemoryInitError};
use crate::config::Config;
use crate::core::hart::{Hart, HartEvents};
use crate::soc::devices::{AtaController, Clint};
use crate::soc::interconnect::PhysicalBus;
use crate::soc::memory::PhysicalMemory;
use crate::sync::SpinLock;
use crate::threading::Thread;

/// Sweep interval of the IRQ pump thread.
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

struct Registry {
    /// Hart `i`'s event state, if hart `i` is currently registered.
    events: Vec<Option<Arc<HartEvents>>>,
    count: usize,
    pump: Option<Thread>,
}

impl Registry {
    fn new() -> Self {
        Self {
            events: (0..MAX_HARTS).map(|_| None).collect(),
            count: 0,
            pump: None,
        }
    }
}

/// Which backing images (if any) to attach to the ATA controller the first
/// hart's creation brings up.
#[derive(Debug, Clone, Default)]
struct AtaImages {
    master: Option<PathBuf>,
    slave: Option<PathBuf>,
}

/// Owns the shared physical bus, the global hart registry, and the IRQ pump
/// thread. Construct with [`System::new`], optionally attach a disk image
/// with [`System::with_ata`], then call [`System::create_vm`] once per hart.
pub struct System {
    bus: Arc<PhysicalBus>,
    registry: Arc<SpinLock<Registry>>,
    ata: Option<AtaImages>,
    config: Config,
}

impl System {
    /// Allocates RAM per `config` and returns an empty system with no harts
    /// and no devices registered yet.
    pub fn new(config: Config) -> Result<Self, MemoryInitError> {
        let mem = PhysicalMemory::new(config.ram_base, config.ram_pages)?;
        Ok(Self {
            bus: Arc::new(PhysicalBus::new(mem)),
            registry: Arc::new(SpinLock::new(Registry::new())),
            ata: None,
            config,
        })
    }

    /// Arranges for an ATA/IDE controller to be attached (data + control MMIO
    /// windows registered on the bus) when the first hart is created.
    /// `master`/`slave` are backing disk image paths; at least one is
    /// required by [`AtaController::new`] once device init actually runs.
    #[must_use]
    pub fn with_ata(mut self, master: Option<PathBuf>, slave: Option<PathBuf>) -> Self {
        self.ata = Some(AtaImages { master, slave });
        self
    }

    /// The shared physical bus, for device authors registering additional
    /// MMIO regions outside this core.
    pub fn bus(&self) -> &Arc<PhysicalBus> {
        &self.bus
    }

    /// Registers and returns a new hart.
    ///
    /// Initializes CSR defaults (done by [`Hart::new`]), registers its CLINT
    /// window so any other hart can raise an IPI on it. For the first hart
    /// only, also performs device init (the ATA controller, if
    /// [`System::with_ata`] was called) and starts the IRQ pump thread.
    pub fn create_vm(&self, hartid: u32) -> Result<Hart, CreateVmError> {
        if hartid as usize >= MAX_HARTS {
            return Err(CreateVmError::HartLimitExceeded {
                hartid,
                limit: MAX_HARTS,
            });
        }

        let mut registry = self.registry.lock();
        if registry.events[hartid as usize].is_some() {
            return Err(CreateVmError::DuplicateHartId { hartid });
        }

        let hart = Hart::new(hartid, Arc::clone(&self.bus), self.config.tlb_size, self.config.timer_freq_hz);

        let clint_base = self.config.clint_base_for(hartid);
        let clint = Arc::new(Clint::new(Arc::clone(&hart.events)));
        assert!(
            self.bus.add_mmio(clint_base, clint_base + 4, clint),
            "CLINT window for hart {hartid} at {clint_base:#x} collides with an existing MMIO region",
        );

        let is_first_hart = registry.count == 0;
        if is_first_hart {
            if let Some(images) = &self.ata {
                let ata = AtaController::new(images.master.as_deref(), images.slave.as_deref())?;
                let data_end = self.config.ata_data_base + 8 * 4;
                let ctl_end = self.config.ata_ctl_base + 2 * 4;
                assert!(
                    self.bus.add_mmio(self.config.ata_data_base, data_end, ata.data_port()),
                    "ATA data port collides with an existing MMIO region",
                );
                assert!(
                    self.bus.add_mmio(self.config.ata_ctl_base, ctl_end, ata.ctl_port()),
                    "ATA control port collides with an existing MMIO region",
                );
            }
        }

        registry.events[hartid as usize] = Some(Arc::clone(&hart.events));
        registry.count += 1;
        if is_first_hart {
            let pump_registry = Arc::clone(&self.registry);
            registry.pump = Some(Thread::spawn(move || irq_pump(&pump_registry)));
        }
        drop(registry);

        tracing::debug!(hartid, "hart registered");
        Ok(hart)
    }

    /// Deregisters hart `hartid` and drops its CLINT MMIO window. Returns
    /// `false` if no such hart was registered. If this was the last
    /// registered hart, the IRQ pump thread is killed outright rather than
    /// asked to wind down.
    pub fn destroy_vm(&self, hartid: u32) -> bool {
        if hartid as usize >= MAX_HARTS {
            return false;
        }
        let mut registry = self.registry.lock();
        if registry.events[hartid as usize].take().is_none() {
            return false;
        }
        registry.count -= 1;
        let clint_base = self.config.clint_base_for(hartid);
        let _ = self.bus.remove_mmio(clint_base);

        if registry.count == 0 {
            if let Some(pump) = registry.pump.take() {
                drop(registry);
                pump.kill();
                tracing::debug!("last hart destroyed, IRQ pump thread killed");
                return true;
            }
        }
        tracing::debug!(hartid, "hart destroyed");
        true
    }
}

/// Body of the IRQ pump thread: sweeps the registry every [`PUMP_INTERVAL`],
/// posting a machine timer interrupt to every currently registered hart.
///
/// Writes here race the CPU threads' own reads of `ev_int`/`ev_int_mask`,
/// which is fine: [`HartEvents::request_interrupt`] folds the post into the
/// hart's event state with the same release-store the run loop's
/// acquire-load on `wait_event` already synchronizes with, and a lost or
/// spurious timer edge is harmless (the run loop reconciles against the real
/// timer comparator in `Hart::run_one_event`).
fn irq_pump(registry: &SpinLock<Registry>) {
    loop {
        std::thread::sleep(PUMP_INTERVAL);
        let reg = registry.lock();
        for events in reg.events.iter().flatten() {
            events.request_interrupt(1 << INTERRUPT_MTIMER);
        }
    }
}
