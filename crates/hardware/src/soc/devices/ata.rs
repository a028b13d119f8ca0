//! ATA/IDE PIO storage controller (primary channel: Data + Control ports).
//!
//! Two MMIO windows share one controller: the eight-register Data port at
//! `ATA_REG_*` offsets 0-7, and the two-register Control port. Both are
//! handed out as separate [`MmioDevice`] handles over the same
//! [`AtaShared`] state so a caller can map them at their conventional,
//! non-adjacent addresses without the controller knowing anything about
//! where it's mapped.
//!
//! Only PIO mode, 28-bit LBA `READ SECTORS`/`WRITE SECTORS`, and
//! `IDENTIFY DEVICE` are implemented — no DMA, no LBA48 transfer commands,
//! no ATAPI. The HOB-shift register read path is kept regardless, since
//! it's how a driver reads the high halves of the 16-bit task-file
//! registers and costs nothing to support even without a 48-bit command
//! wired up to set them.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::common::{AccessType, AtaInitError};
use crate::soc::interconnect::MmioDevice;
use crate::sync::SpinLock;

const SECTOR_SIZE: usize = 512;

/// Byte-offset-to-register shift: task-file registers are 4 bytes apart so
/// a 32-bit-addressed bus can reach every byte register.
const REG_SHIFT: u32 = 2;

const REG_DATA: u32 = 0x00;
const REG_ERROR: u32 = 0x01;
const REG_NSECT: u32 = 0x02;
const REG_LBAL: u32 = 0x03;
const REG_LBAM: u32 = 0x04;
const REG_LBAH: u32 = 0x05;
const REG_DEVICE: u32 = 0x06;
const REG_STATUS: u32 = 0x07;

const REG_CTL: u32 = 0x00;
const REG_DRVADDR: u32 = 0x01;

const STATUS_ERR: u8 = 1 << 0;
const STATUS_DRQ: u8 = 1 << 3;
const STATUS_SRV: u8 = 1 << 4;
const STATUS_RDY: u8 = 1 << 6;

const ERR_AMNF: u16 = 1 << 0;
const ERR_ABRT: u16 = 1 << 2;
const ERR_UNC: u16 = 1 << 6;

const CMD_IDENTIFY: u8 = 0xEC;
const CMD_INITIALIZE_DEVICE_PARAMS: u8 = 0x91;
const CMD_READ_SECTORS: u8 = 0x20;
const CMD_WRITE_SECTORS: u8 = 0x30;

/// One drive's task-file registers, transfer state, and backing file.
struct Drive {
    file: Option<File>,
    /// Capacity in 512-byte sectors; 0 for an unpopulated drive slot.
    size_sectors: u64,
    bytes_to_rw: u16,
    sectcount: u16,
    /// 16-bit shift registers: a driver writes the high byte then the low
    /// byte (or reads either half back via `hob_shift`), which is how a
    /// single byte-wide register offset carries a wider LBA28/LBA48 field.
    lbal: u16,
    lbam: u16,
    lbah: u16,
    drive: u16,
    error: u16,
    status: u8,
    hob_shift: u8,
    buf: [u8; SECTOR_SIZE],
}

impl Drive {
    fn empty() -> Self {
        Self {
            file: None,
            size_sectors: 0,
            bytes_to_rw: 0,
            sectcount: 0,
            lbal: 0,
            lbam: 0,
            lbah: 0,
            drive: 0,
            error: 0,
            status: 0,
            hob_shift: 0,
            buf: [0; SECTOR_SIZE],
        }
    }

    fn open(path: &Path) -> Result<Self, AtaInitError> {
        let map_io = |source: std::io::Error| AtaInitError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = OpenOptions::new().read(true).write(true).open(path).map_err(map_io)?;
        let len = file.metadata().map_err(map_io)?.len();
        if len == 0 {
            return Err(AtaInitError::Empty {
                path: path.display().to_string(),
            });
        }
        let size_sectors = len.div_ceil(SECTOR_SIZE as u64);
        Ok(Self {
            file: Some(file),
            size_sectors,
            ..Self::empty()
        })
    }

    /// 28-bit LBA assembled from the low byte of LBAL/LBAM/LBAH and the low
    /// nibble of the DEVICE register.
    fn lba28(&self) -> u64 {
        u64::from(self.lbal & 0xFF)
            | (u64::from(self.lbam & 0xFF) << 8)
            | (u64::from(self.lbah & 0xFF) << 16)
            | (u64::from(self.drive & 0xF) << 24)
    }

    fn read_sector(&mut self) -> bool {
        let Some(file) = self.file.as_mut() else { return false };
        if file.read_exact(&mut self.buf).is_err() {
            return false;
        }
        self.bytes_to_rw = SECTOR_SIZE as u16;
        true
    }

    fn write_sector(&mut self) -> bool {
        let Some(file) = self.file.as_mut() else { return false };
        file.write_all(&self.buf).is_ok()
    }

    fn cmd_identify(&mut self) {
        let mut words = [0u16; SECTOR_SIZE / 2];
        words[0] = 1 << 6; // non-removable, ATA device
        words[1] = 65535; // logical cylinders
        words[3] = 16; // logical heads
        words[6] = 63; // sectors per track
        words[22] = 4; // bytes available in READ/WRITE LONG
        words[49] = 1 << 9; // LBA supported
        words[50] = 1 << 14; // required by ATA/ATAPI-5
        words[51] = 4 << 8; // PIO cycle timing mode
        words[53] = 1 | 2; // fields 54-58 and 64-70 valid
        words[54] = 65535;
        words[55] = 16;
        words[56] = 63;
        let (lo, hi) = if self.size_sectors > 0xFFFF_FFFF {
            (0xFFFF, 0xFFFF)
        } else {
            ((self.size_sectors & 0xFFFF) as u16, (self.size_sectors >> 16) as u16)
        };
        words[57] = lo;
        words[58] = hi;
        words[60] = lo;
        words[61] = hi;
        words[64] = 1 | 2; // advanced PIO modes
        words[67] = 1;
        words[68] = 1;

        for (word, chunk) in words.iter().zip(self.buf.chunks_exact_mut(2)) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        self.bytes_to_rw = SECTOR_SIZE as u16;
        self.status = STATUS_RDY | STATUS_SRV | STATUS_DRQ;
        self.sectcount = 1;
    }

    fn cmd_initialize_device_params(&mut self) {
        // CHS translation isn't supported.
        self.status |= STATUS_ERR;
        self.error |= ERR_ABRT;
    }

    fn cmd_read_sectors(&mut self) {
        if self.sectcount == 0 {
            self.sectcount = 256;
        }
        self.status |= STATUS_DRQ | STATUS_RDY;
        let lba = self.lba28();
        let seeked = self
            .file
            .as_mut()
            .and_then(|f| f.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64)).ok())
            .is_some();
        if !seeked || !self.read_sector() {
            self.status |= STATUS_ERR;
            self.error |= ERR_UNC;
        }
    }

    fn cmd_write_sectors(&mut self) {
        if self.sectcount == 0 {
            self.sectcount = 256;
        }
        self.status |= STATUS_DRQ | STATUS_RDY;
        let lba = self.lba28();
        let seeked = self
            .file
            .as_mut()
            .and_then(|f| f.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64)).ok())
            .is_some();
        if seeked {
            self.bytes_to_rw = SECTOR_SIZE as u16;
        } else {
            self.status |= STATUS_ERR;
            self.error |= ERR_UNC;
        }
    }

    fn handle_cmd(&mut self, cmd: u8) {
        match cmd {
            CMD_IDENTIFY => self.cmd_identify(),
            CMD_INITIALIZE_DEVICE_PARAMS => self.cmd_initialize_device_params(),
            CMD_READ_SECTORS => self.cmd_read_sectors(),
            CMD_WRITE_SECTORS => self.cmd_write_sectors(),
            _ => {}
        }
    }

    fn soft_reset(&mut self) {
        self.bytes_to_rw = 0;
        self.lbal = 1; // sectors start from 1
        self.lbah = 0;
        self.lbam = 0;
        self.sectcount = 1;
        self.drive = 0;
        if self.file.is_some() {
            self.error = ERR_AMNF; // means OK here
            self.status = STATUS_RDY | STATUS_SRV;
        } else {
            self.error = 0;
            self.status = 0;
        }
    }
}

/// State shared by the Data and Control port MMIO handles.
struct AtaShared {
    drives: [SpinLock<Drive>; 2],
    curdrive: AtomicU8,
}

impl AtaShared {
    fn current(&self) -> &SpinLock<Drive> {
        &self.drives[self.curdrive.load(Ordering::Relaxed) as usize]
    }
}

/// Owns both drive slots; hand out [`AtaController::data_port`] and
/// [`AtaController::ctl_port`] to register the two MMIO windows.
pub struct AtaController {
    shared: Arc<AtaShared>,
}

impl AtaController {
    /// Opens `master`/`slave` backing images. At least one must be given.
    pub fn new(master: Option<&Path>, slave: Option<&Path>) -> Result<Self, AtaInitError> {
        if master.is_none() && slave.is_none() {
            return Err(AtaInitError::NoDrives);
        }
        let d0 = master.map_or_else(|| Ok(Drive::empty()), Drive::open)?;
        let d1 = slave.map_or_else(|| Ok(Drive::empty()), Drive::open)?;
        Ok(Self {
            shared: Arc::new(AtaShared {
                drives: [SpinLock::new(d0), SpinLock::new(d1)],
                curdrive: AtomicU8::new(0),
            }),
        })
    }

    /// The 8-register task-file port (`ATA_REG_DATA` through `ATA_REG_STATUS`).
    pub fn data_port(&self) -> Arc<dyn MmioDevice> {
        Arc::new(DataPort(Arc::clone(&self.shared)))
    }

    /// The device-control port (alternate status + device control + drive address).
    pub fn ctl_port(&self) -> Arc<dyn MmioDevice> {
        Arc::new(CtlPort(Arc::clone(&self.shared)))
    }
}

struct DataPort(Arc<AtaShared>);

impl MmioDevice for DataPort {
    fn access(&self, offset: u32, buf: &mut [u8], size: u8, access: AccessType) -> bool {
        if offset & ((1 << REG_SHIFT) - 1) != 0 {
            return false;
        }
        let reg = offset >> REG_SHIFT;
        if size != 1 && reg != REG_DATA {
            return false;
        }

        let mut drive = self.0.current().lock();
        match reg {
            REG_DATA => data_register(&mut drive, buf, access),
            REG_ERROR => {
                if access != AccessType::Write {
                    buf[0] = (drive.error & 0xFF) as u8;
                }
            }
            REG_NSECT => shift_register(&mut drive.sectcount, drive.hob_shift, buf, access),
            REG_LBAL => shift_register(&mut drive.lbal, drive.hob_shift, buf, access),
            REG_LBAM => shift_register(&mut drive.lbam, drive.hob_shift, buf, access),
            REG_LBAH => shift_register(&mut drive.lbah, drive.hob_shift, buf, access),
            REG_DEVICE => {
                if access == AccessType::Write {
                    let val = buf[0];
                    self.0.curdrive.store(u8::from(val & (1 << 4) != 0), Ordering::Relaxed);
                    drop(drive);
                    self.0.current().lock().drive = u16::from(val);
                } else {
                    buf[0] = (drive.drive as u8) | (1 << 5) | (1 << 7);
                }
            }
            REG_STATUS => {
                if access == AccessType::Write {
                    drive.error = 0;
                    drive.status &= !STATUS_ERR;
                    let cmd = buf[0];
                    drive.handle_cmd(cmd);
                } else {
                    buf[0] = drive.status;
                }
            }
            _ => return false,
        }
        true
    }
}

fn data_register(drive: &mut Drive, buf: &mut [u8], access: AccessType) {
    let size = buf.len();
    match access {
        AccessType::Write => {
            let start = SECTOR_SIZE - drive.bytes_to_rw as usize;
            drive.buf[start..start + size].copy_from_slice(buf);
            drive.bytes_to_rw -= size as u16;
            if drive.bytes_to_rw == 0 {
                drive.status &= !STATUS_DRQ;
                drive.sectcount -= 1;
                if drive.sectcount != 0 {
                    drive.status |= STATUS_DRQ;
                    drive.bytes_to_rw = SECTOR_SIZE as u16;
                }
                if !drive.write_sector() {
                    drive.status |= STATUS_ERR;
                    drive.error |= ERR_UNC;
                }
            }
        }
        _ => {
            if drive.bytes_to_rw != 0 {
                let start = SECTOR_SIZE - drive.bytes_to_rw as usize;
                buf.copy_from_slice(&drive.buf[start..start + size]);
                drive.bytes_to_rw -= size as u16;
                if drive.bytes_to_rw == 0 {
                    drive.status &= !STATUS_DRQ;
                    drive.sectcount -= 1;
                    if drive.sectcount != 0 {
                        drive.status |= STATUS_DRQ;
                        if !drive.read_sector() {
                            drive.status |= STATUS_ERR;
                            drive.error |= ERR_UNC;
                        }
                    }
                }
            } else {
                buf.fill(0);
            }
        }
    }
}

/// Services a 16-bit shift register: write shifts the new byte in from the
/// bottom, read returns either half selected by `hob_shift` (0 or 8).
fn shift_register(reg: &mut u16, hob_shift: u8, buf: &mut [u8], access: AccessType) {
    if access == AccessType::Write {
        *reg = (*reg << 8) | u16::from(buf[0]);
    } else {
        buf[0] = ((*reg >> hob_shift) & 0xFF) as u8;
    }
}

struct CtlPort(Arc<AtaShared>);

impl MmioDevice for CtlPort {
    fn access(&self, offset: u32, buf: &mut [u8], size: u8, access: AccessType) -> bool {
        if size != 1 || offset & ((1 << REG_SHIFT) - 1) != 0 {
            return false;
        }
        let reg = offset >> REG_SHIFT;
        let mut drive = self.0.current().lock();
        match reg {
            REG_CTL => {
                if access == AccessType::Read {
                    buf[0] = drive.status;
                } else {
                    let val = buf[0];
                    drive.hob_shift = if val & (1 << 7) != 0 { 8 } else { 0 };
                    if val & (1 << 2) != 0 {
                        drive.soft_reset();
                    }
                }
            }
            REG_DRVADDR => {}
            _ => return false,
        }
        true
    }
}
