//! Construction-time configuration for a [`crate::System`].
//!
//! Bundles the parameters an embedder building a multi-hart VM needs in one
//! place: RAM geometry, per-hart TLB sizing, timer rate, and the fixed MMIO
//! addresses this core assigns to devices. One value to thread through
//! `System::new`, with `Config::default()` giving a working single-hart
//! layout out of the box.
//!
//! There is no JSON/TOML front-end here: that lives in whatever CLI or host
//! application embeds this crate.

/// Default configuration constants.
mod defaults {
    /// Base guest physical address of main RAM (2 GiB).
    pub const RAM_BASE: u32 = 0x8000_0000;

    /// RAM size in 4 KiB pages. 65536 pages is 256 MiB.
    pub const RAM_PAGES: u32 = 65536;

    /// Direct-mapped TLB entry count, one per hart (rounded to a power of two).
    pub const TLB_SIZE: usize = 256;

    /// Machine timer frequency in Hz (10 MHz).
    pub const TIMER_FREQ_HZ: u64 = 10_000_000;

    /// Base address of the first hart's per-hart CLINT (MSIP) MMIO window.
    pub const CLINT_BASE: u32 = 0x0200_0000;

    /// Address stride between consecutive harts' CLINT windows.
    pub const CLINT_STRIDE: u32 = 0x1000;

    /// Base address of the ATA/IDE data (task-file) port window.
    pub const ATA_DATA_BASE: u32 = 0x4000_0000;

    /// Base address of the ATA/IDE device-control port window.
    pub const ATA_CTL_BASE: u32 = 0x4000_1000;
}

/// Parameters needed to build a [`crate::System`]: RAM geometry, per-hart MMU
/// sizing, the machine timer rate, and the fixed MMIO addresses this core
/// assigns to the per-hart CLINT windows and the ATA controller.
///
/// # Examples
///
/// ```
/// use riscv_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.ram_base, 0x8000_0000);
/// assert_eq!(config.ram_pages, 65536);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Guest physical base address of RAM.
    pub ram_base: u32,
    /// RAM size in 4 KiB pages.
    pub ram_pages: u32,
    /// Entry count for each hart's data and instruction TLB.
    pub tlb_size: usize,
    /// Machine timer tick frequency in Hz.
    pub timer_freq_hz: u64,
    /// Base address of hart 0's CLINT (MSIP) window; hart `n` is mapped at
    /// `clint_base + n * clint_stride`.
    pub clint_base: u32,
    /// Address stride between consecutive harts' CLINT windows.
    pub clint_stride: u32,
    /// Base address of the ATA/IDE data (task-file) port window.
    pub ata_data_base: u32,
    /// Base address of the ATA/IDE device-control port window.
    pub ata_ctl_base: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram_base: defaults::RAM_BASE,
            ram_pages: defaults::RAM_PAGES,
            tlb_size: defaults::TLB_SIZE,
            timer_freq_hz: defaults::TIMER_FREQ_HZ,
            clint_base: defaults::CLINT_BASE,
            clint_stride: defaults::CLINT_STRIDE,
            ata_data_base: defaults::ATA_DATA_BASE,
            ata_ctl_base: defaults::ATA_CTL_BASE,
        }
    }
}

impl Config {
    /// The address of hart `hartid`'s CLINT (MSIP) MMIO window.
    pub fn clint_base_for(&self, hartid: u32) -> u32 {
        self.clint_base.wrapping_add(hartid.wrapping_mul(self.clint_stride))
    }
}
