//! Direct-mapped translation lookaside buffer for Sv32.
//!
//! A single comparison validates address and permissions: each entry's tag
//! packs the cached virtual page number together with the permission bits
//! it was installed with. Regular 4 KiB pages and 4 MiB superpages are
//! indexed differently (a superpage by its megapage number, so every 4 KiB
//! sub-page within it shares one slot), which is why lookup tries both
//! index functions in turn rather than picking one up front.

/// One cached translation.
#[derive(Clone, Copy, Default)]
struct TlbEntry {
    /// Tag: the full VPN for a 4 KiB entry, or the VPN with its low 10 bits
    /// cleared for a 4 MiB entry.
    tag: u32,
    /// Physical page number this VPN maps to.
    ppn: u32,
    /// Entry validity flag.
    valid: bool,
    /// Covers a 4 MiB superpage rather than a single 4 KiB page.
    huge: bool,
    /// Read permission.
    r: bool,
    /// Write permission.
    w: bool,
    /// Execute permission.
    x: bool,
    /// User-mode accessible.
    u: bool,
}

/// A translated entry as returned by a successful [`Tlb::lookup`].
#[derive(Clone, Copy, Debug)]
pub struct TlbHit {
    /// Physical page number this translation resolves to.
    pub ppn: u32,
    /// Whether the mapping covers a 4 MiB superpage.
    pub huge: bool,
    /// Read permission.
    pub r: bool,
    /// Write permission.
    pub w: bool,
    /// Execute permission.
    pub x: bool,
    /// User-mode accessible.
    pub u: bool,
}

impl TlbEntry {
    fn hit(&self) -> TlbHit {
        TlbHit {
            ppn: self.ppn,
            huge: self.huge,
            r: self.r,
            w: self.w,
            x: self.x,
            u: self.u,
        }
    }
}

/// Direct-mapped TLB, sized to a power of two.
pub struct Tlb {
    entries: Vec<TlbEntry>,
    mask: usize,
}

impl Tlb {
    /// Creates a new TLB with the given entry count, rounded up to the next
    /// power of two.
    pub fn new(size: usize) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            entries: vec![TlbEntry::default(); size],
            mask: size - 1,
        }
    }

    fn page_index(&self, vpn: u32) -> usize {
        (vpn as usize) & self.mask
    }

    fn superpage_index(&self, vpn: u32) -> usize {
        ((vpn >> 10) as usize) & self.mask
    }

    /// Looks up `vpn` (the virtual address shifted right by 12), checking
    /// the 4 KiB slot first and falling back to the 4 MiB slot.
    ///
    /// # Panics
    ///
    /// Never: both index functions mask by `self.mask = entries.len() - 1`
    /// and `entries.len()` is a power of two, so indices are always in
    /// bounds.
    #[inline(always)]
    pub fn lookup(&self, vpn: u32) -> Option<TlbHit> {
        let page_idx = self.page_index(vpn);
        let page_entry = &self.entries[page_idx];
        if page_entry.valid && !page_entry.huge && page_entry.tag == vpn {
            return Some(page_entry.hit());
        }

        let huge_idx = self.superpage_index(vpn);
        let huge_entry = &self.entries[huge_idx];
        if huge_entry.valid && huge_entry.huge && huge_entry.tag == (vpn & !0x3FF) {
            return Some(huge_entry.hit());
        }

        None
    }

    /// Installs a mapping for `vpn`, unconditionally evicting whatever
    /// previously occupied that direct-mapped slot.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(&mut self, vpn: u32, ppn: u32, huge: bool, r: bool, w: bool, x: bool, u: bool) {
        let idx = if huge {
            self.superpage_index(vpn)
        } else {
            self.page_index(vpn)
        };
        let tag = if huge { vpn & !0x3FF } else { vpn };
        self.entries[idx] = TlbEntry {
            tag,
            ppn,
            valid: true,
            huge,
            r,
            w,
            x,
            u,
        };
    }

    /// Invalidates every entry. Required on a root-page-table write, a
    /// privilege change affecting translation, and SFENCE.VMA.
    pub fn flush(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
    }
}
