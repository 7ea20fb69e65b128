//! The ordered section layout of a cell descriptor.
//!
//! A cell descriptor stores its variable-length sections back-to-back after
//! the fixed-size header, in one fixed order that is part of the format's
//! contract. [`SectionKind`] declares that order together with each kind's
//! element size, and [`CellLayout`] folds the header's count fields over it
//! to produce the byte offset of every section and the total payload size.

use core::mem;

use cell_config_raw::{
    CacheRegion, CellDesc, Irqchip, MemoryRegion, PciCapability, PciDevice, PioRegion, QosDevice,
    StreamId,
};

use crate::ParseConfigError;

/// The size, in bytes, of the fixed cell descriptor header.
pub const CELL_HEADER_SIZE: usize = mem::size_of::<CellDesc>();

/// The number of section kinds in a cell descriptor.
pub const SECTION_KIND_COUNT: usize = 9;

/// The kinds of variable-length sections of a cell descriptor, declared in
/// their storage order.
///
/// Reordering these variants changes the format and breaks compatibility
/// with existing descriptors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKind {
    /// The CPU set bitmap; raw bytes, sized by the header's `cpu_set_size`
    /// field rather than an element count.
    CpuSet,
    /// [`MemoryRegion`] records.
    MemoryRegions,
    /// [`CacheRegion`] records.
    CacheRegions,
    /// [`Irqchip`] records.
    Irqchips,
    /// [`PioRegion`] records.
    PioRegions,
    /// [`PciDevice`] records.
    PciDevices,
    /// [`PciCapability`] records.
    PciCapabilities,
    /// [`StreamId`] entries.
    StreamIds,
    /// [`QosDevice`] records.
    QosDevices,
}

impl SectionKind {
    /// All section kinds, in their storage order.
    pub const ALL: [SectionKind; SECTION_KIND_COUNT] = [
        SectionKind::CpuSet,
        SectionKind::MemoryRegions,
        SectionKind::CacheRegions,
        SectionKind::Irqchips,
        SectionKind::PioRegions,
        SectionKind::PciDevices,
        SectionKind::PciCapabilities,
        SectionKind::StreamIds,
        SectionKind::QosDevices,
    ];

    /// The size, in bytes, of one element of this section kind.
    ///
    /// The CPU set is a raw bitmap, so its element size is one byte.
    pub const fn element_size(self) -> usize {
        match self {
            SectionKind::CpuSet => 1,
            SectionKind::MemoryRegions => mem::size_of::<MemoryRegion>(),
            SectionKind::CacheRegions => mem::size_of::<CacheRegion>(),
            SectionKind::Irqchips => mem::size_of::<Irqchip>(),
            SectionKind::PioRegions => mem::size_of::<PioRegion>(),
            SectionKind::PciDevices => mem::size_of::<PciDevice>(),
            SectionKind::PciCapabilities => mem::size_of::<PciCapability>(),
            SectionKind::StreamIds => mem::size_of::<StreamId>(),
            SectionKind::QosDevices => mem::size_of::<QosDevice>(),
        }
    }

    /// The position of this section kind in the storage order.
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// A short human-readable name for this section kind.
    pub const fn name(self) -> &'static str {
        match self {
            SectionKind::CpuSet => "cpu set",
            SectionKind::MemoryRegions => "memory regions",
            SectionKind::CacheRegions => "cache regions",
            SectionKind::Irqchips => "irqchips",
            SectionKind::PioRegions => "pio regions",
            SectionKind::PciDevices => "pci devices",
            SectionKind::PciCapabilities => "pci capabilities",
            SectionKind::StreamIds => "stream ids",
            SectionKind::QosDevices => "qos devices",
        }
    }
}

/// The section count fields of a cell descriptor header.
///
/// `cpu_set_size` is a byte length; all other fields are element counts.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct SectionCounts {
    /// The size, in bytes, of the CPU set section.
    pub cpu_set_size: u32,
    /// The number of memory region records.
    pub num_memory_regions: u32,
    /// The number of cache region records.
    pub num_cache_regions: u32,
    /// The number of irqchip records.
    pub num_irqchips: u32,
    /// The number of port I/O range records.
    pub num_pio_regions: u32,
    /// The number of PCI device records.
    pub num_pci_devices: u32,
    /// The number of PCI capability records.
    pub num_pci_caps: u32,
    /// The number of stream id entries.
    pub num_stream_ids: u32,
    /// The number of QoS device records.
    pub num_qos_devices: u32,
}

impl SectionCounts {
    /// The element count of the given section kind.
    ///
    /// For [`SectionKind::CpuSet`] this is the byte length of the bitmap,
    /// matching its one-byte element size.
    pub const fn count(&self, kind: SectionKind) -> u32 {
        match kind {
            SectionKind::CpuSet => self.cpu_set_size,
            SectionKind::MemoryRegions => self.num_memory_regions,
            SectionKind::CacheRegions => self.num_cache_regions,
            SectionKind::Irqchips => self.num_irqchips,
            SectionKind::PioRegions => self.num_pio_regions,
            SectionKind::PciDevices => self.num_pci_devices,
            SectionKind::PciCapabilities => self.num_pci_caps,
            SectionKind::StreamIds => self.num_stream_ids,
            SectionKind::QosDevices => self.num_qos_devices,
        }
    }
}

/// The computed byte offsets of every section of a cell descriptor.
///
/// Offsets are relative to the start of the descriptor. The format computes
/// sizes in `u32`, so a layout whose total size exceeds [`u32::MAX`] does
/// not exist; [`CellLayout::compute`] rejects it instead of wrapping.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CellLayout {
    /// The start offset of each section, indexed by [`SectionKind::ordinal`].
    offsets: [u32; SECTION_KIND_COUNT],
    /// The size, in bytes, of the header plus all sections.
    total_size: u32,
}

impl CellLayout {
    /// Folds `counts` over the section order, yielding each section's start
    /// offset and the total payload size.
    ///
    /// # Errors
    /// Returns [`ParseConfigError::SizeOverflow`] if any section length or
    /// the cumulative size exceeds the format's `u32` size type.
    pub fn compute(counts: &SectionCounts) -> Result<Self, ParseConfigError> {
        let mut offsets = [0u32; SECTION_KIND_COUNT];
        let mut accumulator = CELL_HEADER_SIZE as u64;

        for kind in SectionKind::ALL {
            offsets[kind.ordinal()] = accumulator as u32;

            // Cannot overflow u64: both factors fit in u32.
            let section_len = counts.count(kind) as u64 * kind.element_size() as u64;
            accumulator += section_len;
            if accumulator > u32::MAX as u64 {
                return Err(ParseConfigError::SizeOverflow);
            }
        }

        Ok(Self {
            offsets,
            total_size: accumulator as u32,
        })
    }

    /// The byte offset at which the given section begins, relative to the
    /// start of the descriptor.
    pub const fn offset(&self, kind: SectionKind) -> usize {
        self.offsets[kind.ordinal()] as usize
    }

    /// The length, in bytes, of the given section.
    pub const fn section_len(&self, kind: SectionKind) -> usize {
        let end = match kind.ordinal() + 1 {
            SECTION_KIND_COUNT => self.total_size,
            next => self.offsets[next],
        };
        end as usize - self.offset(kind)
    }

    /// The size, in bytes, of the header plus all sections.
    pub const fn total_size(&self) -> usize {
        self.total_size as usize
    }
}
