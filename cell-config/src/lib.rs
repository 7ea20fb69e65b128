//! Parsing and wrappers for the cell and system descriptor formats.
//!
//! A cell descriptor is a position-independent byte buffer: a fixed-size
//! packed header followed by nine variable-length sections stored
//! back-to-back with no padding. Section boundaries are never read from the
//! section contents; they are computed purely from the header's count
//! fields by [`CellLayout`]. A system descriptor prepends fixed platform
//! fields to one embedded cell descriptor (the root cell) and reuses the
//! same layout rules for its tail.
//!
//! Parsing borrows the input buffer and returns read-only views into it;
//! no decode path mutates or retains the buffer, and no storage is
//! allocated for section contents.

#![cfg_attr(not(test), no_std)]

use core::{error, fmt, marker::PhantomData, mem, str};

use cell_config_raw::{
    CacheRegion, CellDesc, CellFlags, Console, Irqchip, MemoryRegion, PciCapability, PciDevice,
    PioRegion, PlatformInfo, QosDevice, StreamId, SystemDesc, SystemFlags, CELL_NAME_MAXLEN,
    CELL_SIGNATURE, CONFIG_REVISION, SYSTEM_SIGNATURE,
};

pub mod layout;

pub use layout::{CellLayout, SectionCounts, SectionKind, CELL_HEADER_SIZE, SECTION_KIND_COUNT};

/// The size, in bytes, of the fixed part of a system descriptor, excluding
/// the embedded root cell descriptor.
pub const SYSTEM_HEADER_SIZE: usize = mem::offset_of!(SystemDesc, root_cell);

/// A parsed, validated view of a cell descriptor.
///
/// The view borrows the underlying buffer; accessors return either plain
/// copies of header fields or sub-slices of that same buffer.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct CellConfig<'slice> {
    /// The descriptor bytes, trimmed to the computed total size.
    slice: &'slice [u8],
    /// The computed section offsets of the descriptor.
    layout: CellLayout,
}

impl<'slice> CellConfig<'slice> {
    /// Parses the slice and returns a [`CellConfig`] if it holds a valid
    /// cell descriptor.
    ///
    /// The slice may be longer than the descriptor; the excess is ignored.
    ///
    /// # Errors
    /// Returns [`ParseConfigError`] if the signature or revision does not
    /// match, if the section sizes overflow the format's size type, or if
    /// the slice is shorter than the computed total size.
    pub fn parse(slice: &'slice [u8]) -> Result<Self, ParseConfigError> {
        if slice.len() < CELL_HEADER_SIZE {
            return Err(ParseConfigError::SliceTooSmall {
                expected: CELL_HEADER_SIZE,
                found: slice.len(),
            });
        }

        let signature = slice
            .first_chunk::<6>()
            .expect("parsing bounds checking failed");
        if *signature != CELL_SIGNATURE {
            return Err(ParseConfigError::SignatureMismatch { found: *signature });
        }

        let revision = slice[mem::offset_of!(CellDesc, revision)..]
            .first_chunk::<2>()
            .expect("parsing bounds checking failed");
        let revision = u16::from_le_bytes(*revision);
        if revision != CONFIG_REVISION {
            return Err(ParseConfigError::UnsupportedRevision { revision });
        }

        let config = Self {
            slice,
            layout: CellLayout::compute(&read_counts(slice))?,
        };

        let total_size = config.layout.total_size();
        if slice.len() < total_size {
            return Err(ParseConfigError::SliceTooSmall {
                expected: total_size,
                found: slice.len(),
            });
        }

        Ok(Self {
            slice: &slice[..total_size],
            ..config
        })
    }

    /// The name of the cell, up to the first NUL byte.
    ///
    /// Returns [`None`] if the name is not valid UTF-8.
    pub fn name(&self) -> Option<&'slice str> {
        let name = &self.slice[mem::offset_of!(CellDesc, name)..][..CELL_NAME_MAXLEN + 1];
        let length = name
            .iter()
            .position(|byte| 0u8.eq(byte))
            .unwrap_or(CELL_NAME_MAXLEN);

        str::from_utf8(&name[..length]).ok()
    }

    /// The numeric id of the cell.
    pub fn id(&self) -> u32 {
        self.read_u32(mem::offset_of!(CellDesc, id))
    }

    /// Flags that affect the entire cell.
    pub fn flags(&self) -> CellFlags {
        CellFlags(self.read_u32(mem::offset_of!(CellDesc, flags)))
    }

    /// The base interrupt number of the virtual PCI controller.
    pub fn vpci_irq_base(&self) -> u32 {
        self.read_u32(mem::offset_of!(CellDesc, vpci_irq_base))
    }

    /// The address secondary CPUs of the cell are reset to.
    pub fn cpu_reset_address(&self) -> u64 {
        self.read_u64(mem::offset_of!(CellDesc, cpu_reset_address))
    }

    /// The timeout, in cycles, for replies to management messages.
    pub fn msg_reply_timeout(&self) -> u64 {
        self.read_u64(mem::offset_of!(CellDesc, msg_reply_timeout))
    }

    /// The console the cell may use for debug output.
    pub fn console(&self) -> Console {
        read_record(self.slice, mem::offset_of!(CellDesc, console))
    }

    /// The section count fields of the header.
    pub fn counts(&self) -> SectionCounts {
        read_counts(self.slice)
    }

    /// The computed section offsets of the descriptor.
    pub fn layout(&self) -> CellLayout {
        self.layout
    }

    /// The size, in bytes, of the header plus all sections.
    pub fn total_size(&self) -> usize {
        self.layout.total_size()
    }

    /// The raw bytes of the given section.
    pub fn section_bytes(&self, kind: SectionKind) -> &'slice [u8] {
        &self.slice[self.layout.offset(kind)..][..self.layout.section_len(kind)]
    }

    /// The CPU set of the cell.
    pub fn cpu_set(&self) -> CpuSet<'slice> {
        CpuSet {
            slice: self.section_bytes(SectionKind::CpuSet),
        }
    }

    /// The memory region records of the cell.
    pub fn memory_regions(&self) -> ElementTable<'slice, MemoryRegion> {
        self.table(SectionKind::MemoryRegions)
    }

    /// The cache region records of the cell.
    pub fn cache_regions(&self) -> ElementTable<'slice, CacheRegion> {
        self.table(SectionKind::CacheRegions)
    }

    /// The irqchip records of the cell.
    pub fn irqchips(&self) -> ElementTable<'slice, Irqchip> {
        self.table(SectionKind::Irqchips)
    }

    /// The port I/O range records of the cell.
    pub fn pio_regions(&self) -> ElementTable<'slice, PioRegion> {
        self.table(SectionKind::PioRegions)
    }

    /// The PCI device records of the cell.
    pub fn pci_devices(&self) -> ElementTable<'slice, PciDevice> {
        self.table(SectionKind::PciDevices)
    }

    /// The PCI capability records of the cell.
    pub fn pci_caps(&self) -> ElementTable<'slice, PciCapability> {
        self.table(SectionKind::PciCapabilities)
    }

    /// The stream id entries of the cell.
    pub fn stream_ids(&self) -> ElementTable<'slice, StreamId> {
        self.table(SectionKind::StreamIds)
    }

    /// The QoS device records of the cell.
    pub fn qos_devices(&self) -> ElementTable<'slice, QosDevice> {
        self.table(SectionKind::QosDevices)
    }

    /// The underlying slice, trimmed to the descriptor's total size.
    pub fn underlying_slice(&self) -> &'slice [u8] {
        self.slice
    }

    /// The typed element table of the given section kind.
    ///
    /// The element type of `kind` must be `T`; all public callers pair
    /// them correctly.
    fn table<T: Copy>(&self, kind: SectionKind) -> ElementTable<'slice, T> {
        debug_assert_eq!(mem::size_of::<T>(), kind.element_size());
        ElementTable {
            slice: self.section_bytes(kind),
            count: self.counts().count(kind) as usize,
            _element: PhantomData,
        }
    }

    /// Reads a little-endian `u32` header field at `offset`.
    fn read_u32(&self, offset: usize) -> u32 {
        let bytes = self.slice[offset..]
            .first_chunk::<4>()
            .expect("parsing bounds checking failed");
        u32::from_le_bytes(*bytes)
    }

    /// Reads a little-endian `u64` header field at `offset`.
    fn read_u64(&self, offset: usize) -> u64 {
        let bytes = self.slice[offset..]
            .first_chunk::<8>()
            .expect("parsing bounds checking failed");
        u64::from_le_bytes(*bytes)
    }
}

impl fmt::Debug for CellConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("CellConfig");

        debug_struct.field("name", &self.name());
        debug_struct.field("id", &self.id());
        debug_struct.field("flags", &self.flags());
        debug_struct.field("counts", &self.counts());
        debug_struct.field("total_size", &self.total_size());

        debug_struct.finish()
    }
}

/// Reads the section count fields from a cell descriptor header.
///
/// The caller must have validated that `slice` holds at least
/// [`CELL_HEADER_SIZE`] bytes.
fn read_counts(slice: &[u8]) -> SectionCounts {
    /// Reads one little-endian count field at `offset`.
    fn count_field(slice: &[u8], offset: usize) -> u32 {
        let bytes = slice[offset..]
            .first_chunk::<4>()
            .expect("parsing bounds checking failed");
        u32::from_le_bytes(*bytes)
    }

    SectionCounts {
        cpu_set_size: count_field(slice, mem::offset_of!(CellDesc, cpu_set_size)),
        num_memory_regions: count_field(slice, mem::offset_of!(CellDesc, num_memory_regions)),
        num_cache_regions: count_field(slice, mem::offset_of!(CellDesc, num_cache_regions)),
        num_irqchips: count_field(slice, mem::offset_of!(CellDesc, num_irqchips)),
        num_pio_regions: count_field(slice, mem::offset_of!(CellDesc, num_pio_regions)),
        num_pci_devices: count_field(slice, mem::offset_of!(CellDesc, num_pci_devices)),
        num_pci_caps: count_field(slice, mem::offset_of!(CellDesc, num_pci_caps)),
        num_stream_ids: count_field(slice, mem::offset_of!(CellDesc, num_stream_ids)),
        num_qos_devices: count_field(slice, mem::offset_of!(CellDesc, num_qos_devices)),
    }
}

/// Reads a packed record of type `T` from `slice` at `offset`.
///
/// The caller must have validated that `offset + size_of::<T>()` lies
/// within `slice`; `T` must be one of the packed integer-only records of
/// [`cell_config_raw`].
fn read_record<T: Copy>(slice: &[u8], offset: usize) -> T {
    assert!(
        offset + mem::size_of::<T>() <= slice.len(),
        "parsing bounds checking failed"
    );

    // SAFETY: the assertion above guarantees `size_of::<T>()` readable
    // bytes at `offset`, `read_unaligned` has no alignment requirement,
    // and every `T` this crate instantiates is a packed record composed
    // of integers, for which any byte pattern is a valid value.
    unsafe { slice[offset..].as_ptr().cast::<T>().read_unaligned() }
}

/// Various errors that can occur while parsing a descriptor.
///
/// Every variant is a hard failure; there is no partial-success mode.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ParseConfigError {
    /// The given slice is smaller than the size the header declares.
    SliceTooSmall {
        /// The size, in bytes, the descriptor requires.
        expected: usize,
        /// The size, in bytes, of the given slice.
        found: usize,
    },
    /// The descriptor does not carry the expected signature.
    SignatureMismatch {
        /// The bytes found where the signature was expected.
        found: [u8; 6],
    },
    /// The descriptor is of an unsupported format revision.
    UnsupportedRevision {
        /// The revision the descriptor carries.
        revision: u16,
    },
    /// The section sizes declared by the header overflow the format's
    /// size type.
    SizeOverflow,
}

impl fmt::Display for ParseConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SliceTooSmall { expected, found } => write!(
                f,
                "descriptor requires {expected} bytes but only {found} were supplied"
            ),
            Self::SignatureMismatch { found } => {
                write!(f, "unexpected descriptor signature {found:02x?}")
            }
            Self::UnsupportedRevision { revision } => write!(
                f,
                "descriptor revision {revision} is not supported (expected {CONFIG_REVISION})"
            ),
            Self::SizeOverflow => write!(f, "declared section sizes overflow the size type"),
        }
    }
}

impl error::Error for ParseConfigError {}

/// A read-only view of the CPU set section of a cell descriptor.
///
/// The first 8 bytes hold the maximum assignable CPU id; the remainder is
/// a bitmap with one bit per logical CPU id. The bitmap content is never
/// validated against the header's `cpu_set_size` field; the size field is
/// authoritative for layout.
#[derive(Clone, Copy, Debug)]
pub struct CpuSet<'slice> {
    /// The raw bytes of the CPU set section.
    slice: &'slice [u8],
}

impl<'slice> CpuSet<'slice> {
    /// The offset of the bitmap within the section, past the leading
    /// `max_cpu_id` word.
    const BITMAP_OFFSET: usize = 8;

    /// The raw bytes of the CPU set section.
    pub fn as_bytes(&self) -> &'slice [u8] {
        self.slice
    }

    /// The maximum assignable CPU id, stored in the first word of the
    /// section.
    ///
    /// Returns [`None`] if the section is too short to hold the word.
    pub fn max_cpu_id(&self) -> Option<u64> {
        let word = self.slice.first_chunk::<8>()?;
        Some(u64::from_le_bytes(*word))
    }

    /// Returns whether the given CPU id is part of the set.
    ///
    /// CPU ids past the end of the bitmap are not part of the set.
    pub fn contains(&self, cpu_id: u64) -> bool {
        let Some(byte) = usize::try_from(cpu_id / 8)
            .ok()
            .and_then(|index| self.slice.get(Self::BITMAP_OFFSET + index))
        else {
            return false;
        };

        byte & (1 << (cpu_id % 8)) != 0
    }
}

/// A read-only table of fixed-size section elements.
///
/// Elements are stored unaligned; [`ElementTable::get`] returns copies.
#[derive(Clone, Copy, Debug)]
pub struct ElementTable<'slice, T> {
    /// The raw bytes of the section.
    slice: &'slice [u8],
    /// The number of elements in the section.
    count: usize,
    /// The element type of the section.
    _element: PhantomData<T>,
}

impl<'slice, T: Copy> ElementTable<'slice, T> {
    /// The number of elements in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns whether the table holds no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The raw bytes of the section.
    pub fn as_bytes(&self) -> &'slice [u8] {
        self.slice
    }

    /// Returns the element at `index`, or [`None`] if out of bounds.
    pub fn get(&self, index: usize) -> Option<T> {
        if !(index < self.count) {
            return None;
        }

        Some(read_record(self.slice, index * mem::size_of::<T>()))
    }

    /// An [`Iterator`] over the elements of the table.
    pub fn iter(&self) -> ElementIter<'slice, T> {
        ElementIter {
            table: *self,
            index: 0,
        }
    }
}

impl<'slice, T: Copy> IntoIterator for ElementTable<'slice, T> {
    type Item = T;
    type IntoIter = ElementIter<'slice, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An [`Iterator`] over the elements of an [`ElementTable`].
#[derive(Clone, Copy, Debug)]
pub struct ElementIter<'slice, T> {
    /// The table being iterated.
    table: ElementTable<'slice, T>,
    /// The index of the next element to yield.
    index: usize,
}

impl<T: Copy> Iterator for ElementIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.table.get(self.index)?;
        self.index += 1;

        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.count - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Copy> ExactSizeIterator for ElementIter<'_, T> {}

/// A parsed, validated view of a system descriptor.
///
/// A system descriptor is a fixed header (platform/global fields, the
/// hypervisor's own memory region, and a debug console) followed by exactly
/// one embedded cell descriptor, the root cell, which occupies the
/// remainder of the buffer per the cell descriptor rules.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct SystemConfig<'slice> {
    /// The descriptor bytes, trimmed to the computed total size.
    slice: &'slice [u8],
    /// The parsed root cell descriptor.
    root_cell: CellConfig<'slice>,
}

impl<'slice> SystemConfig<'slice> {
    /// Parses the slice and returns a [`SystemConfig`] if it holds a valid
    /// system descriptor.
    ///
    /// The slice may be longer than the descriptor; the excess is ignored.
    ///
    /// # Errors
    /// Returns [`ParseConfigError`] if the system header is malformed or
    /// if the embedded root cell descriptor fails to parse.
    pub fn parse(slice: &'slice [u8]) -> Result<Self, ParseConfigError> {
        if slice.len() < SYSTEM_HEADER_SIZE {
            return Err(ParseConfigError::SliceTooSmall {
                expected: SYSTEM_HEADER_SIZE,
                found: slice.len(),
            });
        }

        let signature = slice
            .first_chunk::<6>()
            .expect("parsing bounds checking failed");
        if *signature != SYSTEM_SIGNATURE {
            return Err(ParseConfigError::SignatureMismatch { found: *signature });
        }

        let revision = slice[mem::offset_of!(SystemDesc, revision)..]
            .first_chunk::<2>()
            .expect("parsing bounds checking failed");
        let revision = u16::from_le_bytes(*revision);
        if revision != CONFIG_REVISION {
            return Err(ParseConfigError::UnsupportedRevision { revision });
        }

        let root_cell = CellConfig::parse(&slice[SYSTEM_HEADER_SIZE..])?;
        let total_size = SYSTEM_HEADER_SIZE + root_cell.total_size();

        Ok(Self {
            slice: &slice[..total_size],
            root_cell,
        })
    }

    /// Flags that affect the entire system.
    pub fn flags(&self) -> SystemFlags {
        let bytes = self.slice[mem::offset_of!(SystemDesc, flags)..]
            .first_chunk::<4>()
            .expect("parsing bounds checking failed");
        SystemFlags(u32::from_le_bytes(*bytes))
    }

    /// The memory region reserved for the hypervisor itself.
    pub fn hypervisor_memory(&self) -> MemoryRegion {
        read_record(self.slice, mem::offset_of!(SystemDesc, hypervisor_memory))
    }

    /// The console the hypervisor uses for debug output.
    pub fn debug_console(&self) -> Console {
        read_record(self.slice, mem::offset_of!(SystemDesc, debug_console))
    }

    /// The platform information block.
    pub fn platform_info(&self) -> PlatformInfo {
        read_record(self.slice, mem::offset_of!(SystemDesc, platform_info))
    }

    /// The raw architecture-specific payload of the platform information
    /// block.
    pub fn arch_bytes(&self) -> &'slice [u8] {
        let offset =
            mem::offset_of!(SystemDesc, platform_info) + mem::offset_of!(PlatformInfo, arch);
        &self.slice[offset..][..cell_config_raw::ARCH_INFO_SIZE]
    }

    /// The x86 view of the architecture-specific payload.
    #[cfg(target_arch = "x86_64")]
    pub fn arch_info(&self) -> cell_config_raw::X86ArchInfo {
        let offset =
            mem::offset_of!(SystemDesc, platform_info) + mem::offset_of!(PlatformInfo, arch);
        read_record(self.slice, offset)
    }

    /// The ARM view of the architecture-specific payload.
    #[cfg(target_arch = "aarch64")]
    pub fn arch_info(&self) -> cell_config_raw::ArmArchInfo {
        let offset =
            mem::offset_of!(SystemDesc, platform_info) + mem::offset_of!(PlatformInfo, arch);
        read_record(self.slice, offset)
    }

    /// The descriptor of the root cell.
    pub fn root_cell(&self) -> CellConfig<'slice> {
        self.root_cell
    }

    /// The size, in bytes, of the fixed header plus the root cell
    /// descriptor and its sections.
    pub fn total_size(&self) -> usize {
        SYSTEM_HEADER_SIZE + self.root_cell.total_size()
    }

    /// The underlying slice, trimmed to the descriptor's total size.
    pub fn underlying_slice(&self) -> &'slice [u8] {
        self.slice
    }
}

impl fmt::Debug for SystemConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("SystemConfig");

        debug_struct.field("flags", &self.flags());
        debug_struct.field("root_cell", &self.root_cell);
        debug_struct.field("total_size", &self.total_size());

        debug_struct.finish()
    }
}

#[cfg(test)]
mod tests {
    use cell_config_raw::ARCH_INFO_SIZE;

    use super::*;

    /// Writes a little-endian `u16` into `buffer` at `offset`.
    fn write_u16(buffer: &mut [u8], offset: usize, value: u16) {
        buffer[offset..][..2].copy_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u32` into `buffer` at `offset`.
    fn write_u32(buffer: &mut [u8], offset: usize, value: u32) {
        buffer[offset..][..4].copy_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u64` into `buffer` at `offset`.
    fn write_u64(buffer: &mut [u8], offset: usize, value: u64) {
        buffer[offset..][..8].copy_from_slice(&value.to_le_bytes());
    }

    /// Synthesizes a cell descriptor of the exact computed size with the
    /// given counts and zeroed sections.
    fn synth_cell(counts: &SectionCounts) -> Vec<u8> {
        let layout = CellLayout::compute(counts).unwrap();
        let mut buffer = vec![0u8; layout.total_size()];

        buffer[..6].copy_from_slice(&CELL_SIGNATURE);
        write_u16(
            &mut buffer,
            mem::offset_of!(CellDesc, revision),
            CONFIG_REVISION,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, cpu_set_size),
            counts.cpu_set_size,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_memory_regions),
            counts.num_memory_regions,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_cache_regions),
            counts.num_cache_regions,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_irqchips),
            counts.num_irqchips,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_pio_regions),
            counts.num_pio_regions,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_pci_devices),
            counts.num_pci_devices,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_pci_caps),
            counts.num_pci_caps,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_stream_ids),
            counts.num_stream_ids,
        );
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_qos_devices),
            counts.num_qos_devices,
        );

        buffer
    }

    /// A counts value exercising every section kind.
    fn sample_counts() -> SectionCounts {
        SectionCounts {
            cpu_set_size: 16,
            num_memory_regions: 2,
            num_cache_regions: 1,
            num_irqchips: 1,
            num_pio_regions: 2,
            num_pci_devices: 1,
            num_pci_caps: 2,
            num_stream_ids: 3,
            num_qos_devices: 1,
        }
    }

    #[test]
    fn zeroed_round_trip_preserves_counts_and_offsets() {
        let counts = sample_counts();
        let buffer = synth_cell(&counts);
        let config = CellConfig::parse(&buffer).unwrap();

        assert_eq!(config.counts(), counts);
        assert_eq!(config.total_size(), buffer.len());
        assert_eq!(config.layout(), CellLayout::compute(&counts).unwrap());

        for kind in SectionKind::ALL {
            let expected_len = counts.count(kind) as usize * kind.element_size();
            assert_eq!(config.section_bytes(kind).len(), expected_len);
            assert!(config.section_bytes(kind).iter().all(|byte| *byte == 0));
        }

        assert_eq!(config.memory_regions().len(), 2);
        assert_eq!(config.pci_devices().len(), 1);
        assert_eq!(config.stream_ids().iter().count(), 3);
    }

    #[test]
    fn buffer_one_byte_short_is_rejected() {
        let buffer = synth_cell(&sample_counts());
        let total = buffer.len();

        assert_eq!(
            CellConfig::parse(&buffer[..total - 1]),
            Err(ParseConfigError::SliceTooSmall {
                expected: total,
                found: total - 1,
            })
        );
    }

    #[test]
    fn excess_trailing_bytes_are_ignored() {
        let mut buffer = synth_cell(&sample_counts());
        let total = buffer.len();
        buffer.extend_from_slice(&[0xa5; 7]);

        let config = CellConfig::parse(&buffer).unwrap();
        assert_eq!(config.total_size(), total);
        assert_eq!(config.underlying_slice().len(), total);
    }

    #[test]
    fn buffer_shorter_than_header_is_rejected() {
        assert_eq!(
            CellConfig::parse(&[0u8; 16]),
            Err(ParseConfigError::SliceTooSmall {
                expected: CELL_HEADER_SIZE,
                found: 16,
            })
        );
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let mut buffer = synth_cell(&SectionCounts::default());
        buffer[..6].copy_from_slice(b"XXCELL");

        assert_eq!(
            CellConfig::parse(&buffer),
            Err(ParseConfigError::SignatureMismatch { found: *b"XXCELL" })
        );
    }

    #[test]
    fn wrong_revision_is_rejected() {
        let mut buffer = synth_cell(&SectionCounts::default());
        write_u16(
            &mut buffer,
            mem::offset_of!(CellDesc, revision),
            CONFIG_REVISION - 1,
        );

        assert_eq!(
            CellConfig::parse(&buffer),
            Err(ParseConfigError::UnsupportedRevision {
                revision: CONFIG_REVISION - 1,
            })
        );
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let mut buffer = synth_cell(&SectionCounts::default());
        write_u32(
            &mut buffer,
            mem::offset_of!(CellDesc, num_memory_regions),
            u32::MAX,
        );

        assert_eq!(
            CellConfig::parse(&buffer),
            Err(ParseConfigError::SizeOverflow)
        );
    }

    #[test]
    fn header_fields_read_back() {
        let mut buffer = synth_cell(&SectionCounts::default());
        let name = b"apu-inmate\0garbage";
        buffer[mem::offset_of!(CellDesc, name)..][..name.len()].copy_from_slice(name);
        write_u32(&mut buffer, mem::offset_of!(CellDesc, id), 3);
        write_u32(&mut buffer, mem::offset_of!(CellDesc, flags), 0x8000_0001);
        write_u64(
            &mut buffer,
            mem::offset_of!(CellDesc, cpu_reset_address),
            0x8000_0000,
        );
        let console_offset = mem::offset_of!(CellDesc, console);
        write_u64(
            &mut buffer,
            console_offset + mem::offset_of!(Console, address),
            0xff01_0000,
        );
        write_u16(
            &mut buffer,
            console_offset + mem::offset_of!(Console, kind),
            cell_config_raw::ConsoleType::PL011.0,
        );

        let config = CellConfig::parse(&buffer).unwrap();
        assert_eq!(config.name(), Some("apu-inmate"));
        assert_eq!(config.id(), 3);
        assert!(config.flags().virtual_console_active());
        assert_eq!(config.cpu_reset_address(), 0x8000_0000);

        let console = config.console();
        assert_eq!({ console.address }, 0xff01_0000);
        assert_eq!({ console.kind }, cell_config_raw::ConsoleType::PL011);
    }

    #[test]
    fn typed_elements_read_back() {
        let counts = sample_counts();
        let mut buffer = synth_cell(&counts);
        let layout = CellLayout::compute(&counts).unwrap();

        let second_region =
            layout.offset(SectionKind::MemoryRegions) + mem::size_of::<MemoryRegion>();
        write_u64(
            &mut buffer,
            second_region + mem::offset_of!(MemoryRegion, phys_start),
            0x4000_0000,
        );
        write_u64(
            &mut buffer,
            second_region + mem::offset_of!(MemoryRegion, size),
            0x10_0000,
        );
        write_u64(
            &mut buffer,
            second_region + mem::offset_of!(MemoryRegion, flags),
            0x0003,
        );

        let device = layout.offset(SectionKind::PciDevices);
        buffer[device + mem::offset_of!(PciDevice, msi_flags)] = PciDevice::MSI_64BITS;
        write_u16(
            &mut buffer,
            device + mem::offset_of!(PciDevice, bdf),
            0x00f8,
        );

        let config = CellConfig::parse(&buffer).unwrap();

        let region = config.memory_regions().get(1).unwrap();
        assert_eq!({ region.phys_start }, 0x4000_0000);
        assert_eq!({ region.size }, 0x10_0000);
        assert_eq!({ region.flags }.0, 0x0003);
        assert!(config.memory_regions().get(2).is_none());

        let device = config.pci_devices().get(0).unwrap();
        assert_eq!({ device.bdf }, 0x00f8);
        assert!(device.msi_64bits());
        assert!(!device.msi_maskable());
    }

    #[test]
    fn cpu_set_bitmap_lookups() {
        let counts = SectionCounts {
            cpu_set_size: 16,
            ..SectionCounts::default()
        };
        let mut buffer = synth_cell(&counts);
        let layout = CellLayout::compute(&counts).unwrap();

        let section = layout.offset(SectionKind::CpuSet);
        write_u64(&mut buffer, section, 3);
        buffer[section + 8] = 0b0000_0101;

        let cpu_set = CellConfig::parse(&buffer).unwrap().cpu_set();
        assert_eq!(cpu_set.max_cpu_id(), Some(3));
        assert!(cpu_set.contains(0));
        assert!(!cpu_set.contains(1));
        assert!(cpu_set.contains(2));
        assert!(!cpu_set.contains(1000));
    }

    #[test]
    fn undersized_cpu_set_has_no_max_cpu_id() {
        let counts = SectionCounts {
            cpu_set_size: 4,
            ..SectionCounts::default()
        };
        let buffer = synth_cell(&counts);

        let cpu_set = CellConfig::parse(&buffer).unwrap().cpu_set();
        assert_eq!(cpu_set.max_cpu_id(), None);
        assert!(!cpu_set.contains(0));
    }

    /// Synthesizes a system descriptor embedding a root cell with the
    /// given counts.
    fn synth_system(counts: &SectionCounts) -> Vec<u8> {
        let mut buffer = vec![0u8; SYSTEM_HEADER_SIZE];
        buffer[..6].copy_from_slice(&SYSTEM_SIGNATURE);
        write_u16(
            &mut buffer,
            mem::offset_of!(SystemDesc, revision),
            CONFIG_REVISION,
        );
        buffer.extend_from_slice(&synth_cell(counts));

        buffer
    }

    #[test]
    fn system_wraps_root_cell() {
        let counts = sample_counts();
        let mut buffer = synth_system(&counts);
        write_u32(&mut buffer, mem::offset_of!(SystemDesc, flags), 0x0001);
        let hypervisor_memory = mem::offset_of!(SystemDesc, hypervisor_memory);
        write_u64(
            &mut buffer,
            hypervisor_memory + mem::offset_of!(MemoryRegion, phys_start),
            0x7000_0000,
        );
        write_u64(
            &mut buffer,
            hypervisor_memory + mem::offset_of!(MemoryRegion, size),
            0x400_0000,
        );

        let system = SystemConfig::parse(&buffer).unwrap();
        assert!(system.flags().virtual_debug_console());
        assert_eq!(
            system.total_size(),
            SYSTEM_HEADER_SIZE + CellLayout::compute(&counts).unwrap().total_size()
        );

        let memory = system.hypervisor_memory();
        assert_eq!({ memory.phys_start }, 0x7000_0000);
        assert_eq!({ memory.size }, 0x400_0000);

        assert_eq!(system.arch_bytes().len(), ARCH_INFO_SIZE);
        assert_eq!(system.root_cell().counts(), counts);
        assert_eq!(
            system.root_cell().layout(),
            CellLayout::compute(&counts).unwrap()
        );
    }

    #[test]
    fn truncated_system_is_rejected() {
        let buffer = synth_system(&sample_counts());
        let cell_total = buffer.len() - SYSTEM_HEADER_SIZE;

        assert_eq!(
            SystemConfig::parse(&buffer[..buffer.len() - 1]),
            Err(ParseConfigError::SliceTooSmall {
                expected: cell_total,
                found: cell_total - 1,
            })
        );
        assert_eq!(
            SystemConfig::parse(&buffer[..SYSTEM_HEADER_SIZE - 1]),
            Err(ParseConfigError::SliceTooSmall {
                expected: SYSTEM_HEADER_SIZE,
                found: SYSTEM_HEADER_SIZE - 1,
            })
        );
    }

    #[test]
    fn system_signature_is_checked() {
        let mut buffer = synth_system(&SectionCounts::default());
        buffer[..6].copy_from_slice(b"XXSYST");
        assert_eq!(
            SystemConfig::parse(&buffer),
            Err(ParseConfigError::SignatureMismatch { found: *b"XXSYST" })
        );

        // A cell descriptor is not a system descriptor.
        let cell = synth_cell(&SectionCounts::default());
        assert_eq!(
            SystemConfig::parse(&cell),
            Err(ParseConfigError::SliceTooSmall {
                expected: SYSTEM_HEADER_SIZE,
                found: cell.len(),
            })
        );
    }
}
