//! Definitions for the cell and system descriptor formats.
//!
//! Every record in this crate mirrors the on-disk layout exactly: all records
//! are packed, all integers are little-endian, and sections follow each other
//! with no alignment padding. The flag and type constants carried here are
//! vocabulary only; the codec never interprets them.

#![cfg_attr(not(test), no_std)]

/// The signature identifying a cell descriptor.
pub const CELL_SIGNATURE: [u8; 6] = *b"JHCELL";
/// The signature identifying a system descriptor.
pub const SYSTEM_SIGNATURE: [u8; 6] = *b"JHSYST";

/// The descriptor format revision this crate describes.
///
/// Descriptors carrying any other revision must be rejected, not coerced.
pub const CONFIG_REVISION: u16 = 13;

/// The maximum number of visible bytes in a cell name.
///
/// The name field itself is one byte longer to hold the NUL terminator.
pub const CELL_NAME_MAXLEN: usize = 31;

/// The number of IOMMU unit slots in the platform information block.
pub const MAX_IOMMU_UNITS: usize = 8;
/// The number of per-CPU PMU interrupt slots in the memguard block.
pub const MAX_PMU2CPU_IRQ: usize = 8;

/// The size, in bytes, of the architecture-specific payload of the platform
/// information block.
///
/// This is the size of the larger of the two architecture views
/// ([`ArmArchInfo`]); the [`X86ArchInfo`] view occupies its leading bytes.
pub const ARCH_INFO_SIZE: usize = 44;

/// The size, in bytes, of the variant payload of an [`IommuUnit`].
pub const IOMMU_VARIANT_SIZE: usize = 12;

/// A console descriptor, embedded in both cell and system descriptors.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Console {
    /// The base address of the console device.
    pub address: u64,
    /// The size, in bytes, of the console register region.
    pub size: u32,
    /// The type of the console device.
    pub kind: ConsoleType,
    /// Flags that affect how the console device is accessed.
    pub flags: ConsoleFlags,
    /// The baud divider of the console device.
    pub divider: u32,
    /// The clock gate number of the console device.
    pub gate_nr: u32,
    /// The address of the clock gating register of the console device.
    pub clock_reg: u64,
}

/// The type of a console device.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ConsoleType(pub u16);

impl ConsoleType {
    /// No console.
    pub const NONE: Self = Self(0x0000);
    /// An EFI framebuffer console.
    pub const EFIFB: Self = Self(0x0001);
    /// An 8250-compatible UART.
    pub const UART_8250: Self = Self(0x0002);
    /// An ARM PL011 UART.
    pub const PL011: Self = Self(0x0003);
    /// A Xilinx UartPS UART.
    pub const XUARTPS: Self = Self(0x0004);
    /// A Marvell EBU UART.
    pub const MVEBU: Self = Self(0x0005);
    /// A Renesas HSCIF UART.
    pub const HSCIF: Self = Self(0x0006);
    /// A Renesas SCIFA UART.
    pub const SCIFA: Self = Self(0x0007);
    /// An i.MX UART.
    pub const IMX: Self = Self(0x0008);
    /// An i.MX LPUART.
    pub const IMX_LPUART: Self = Self(0x0009);
    /// An NXP LINFlexD UART.
    pub const LINFLEX: Self = Self(0x000a);
}

/// Flags that affect how a console device is accessed.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ConsoleFlags(pub u16);

impl ConsoleFlags {
    /// The console registers are accessed through port I/O.
    pub const ACCESS_PIO: Self = Self(0x0000);
    /// The console registers are accessed through memory-mapped I/O.
    pub const ACCESS_MMIO: Self = Self(0x0001);
    /// Console registers are 4 bytes apart (32-bit access); cleared means
    /// 1 byte apart (8-bit access).
    pub const REGDIST_4: Self = Self(0x0002);
    /// The framebuffer format is 1920x1080 rather than 1024x768.
    pub const FB_1920X1080: Self = Self(0x0004);
    /// The clock gate must be cleared instead of set.
    pub const INVERTED_GATE: Self = Self(0x1000);
    /// An MDR quirk must be applied to the console.
    pub const MDR_QUIRK: Self = Self(0x2000);

    /// Returns whether the console registers are accessed through
    /// memory-mapped I/O.
    pub const fn is_mmio(self) -> bool {
        self.0 & Self::ACCESS_MMIO.0 != 0
    }

    /// Returns whether console registers are 1 byte apart.
    pub const fn uses_regdist_1(self) -> bool {
        self.0 & Self::REGDIST_4.0 == 0
    }
}

/// The fixed-size header of a cell descriptor.
///
/// The nine variable-length sections of the descriptor follow this header
/// back-to-back, in the order of the count fields below, with no padding
/// between sections.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CellDesc {
    /// Must equal [`CELL_SIGNATURE`].
    pub signature: [u8; 6],
    /// Must equal [`CONFIG_REVISION`].
    pub revision: u16,
    /// The NUL-terminated name of the cell.
    pub name: [u8; CELL_NAME_MAXLEN + 1],
    /// The numeric id of the cell.
    pub id: u32,
    /// Flags that affect the entire cell.
    pub flags: CellFlags,
    /// The size, in bytes, of the CPU set section.
    pub cpu_set_size: u32,
    /// The number of [`MemoryRegion`] records.
    pub num_memory_regions: u32,
    /// The number of [`CacheRegion`] records.
    pub num_cache_regions: u32,
    /// The number of [`Irqchip`] records.
    pub num_irqchips: u32,
    /// The number of [`PioRegion`] records.
    pub num_pio_regions: u32,
    /// The number of [`PciDevice`] records.
    pub num_pci_devices: u32,
    /// The number of [`PciCapability`] records.
    pub num_pci_caps: u32,
    /// The number of [`StreamId`] entries.
    pub num_stream_ids: u32,
    /// The number of [`QosDevice`] records.
    pub num_qos_devices: u32,
    /// The base interrupt number of the virtual PCI controller.
    pub vpci_irq_base: u32,
    /// The address secondary CPUs of the cell are reset to.
    pub cpu_reset_address: u64,
    /// The timeout, in cycles, for replies to management messages.
    pub msg_reply_timeout: u64,
    /// The console the cell may use for debug output.
    pub console: Console,
}

/// Flags that affect an entire cell.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CellFlags(pub u32);

impl CellFlags {
    /// The communication region of the cell is passive.
    pub const PASSIVE_COMMREG: Self = Self(0x0000_0001);
    /// The cell has access to the test device.
    pub const TEST_DEVICE: Self = Self(0x0000_0002);
    /// The cell runs in AArch32 state.
    pub const AARCH32: Self = Self(0x0000_0004);
    /// The cell is permitted to use the virtual console.
    pub const VIRTUAL_CONSOLE_PERMITTED: Self = Self(0x4000_0000);
    /// The virtual console of the cell is active.
    pub const VIRTUAL_CONSOLE_ACTIVE: Self = Self(0x8000_0000);

    /// Returns whether the cell is permitted to use the virtual console.
    pub const fn virtual_console_permitted(self) -> bool {
        self.0 & Self::VIRTUAL_CONSOLE_PERMITTED.0 != 0
    }

    /// Returns whether the virtual console of the cell is active.
    pub const fn virtual_console_active(self) -> bool {
        self.0 & Self::VIRTUAL_CONSOLE_ACTIVE.0 != 0
    }
}

/// A memory region assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MemoryRegion {
    /// The physical start address of the region.
    pub phys_start: u64,
    /// The virtual start address of the region inside the cell.
    pub virt_start: u64,
    /// The size, in bytes, of the region.
    pub size: u64,
    /// Flags that affect the mapping of the region.
    pub flags: MemoryFlags,
    /// The cache color bitmap of the region.
    pub colors: u64,
}

/// Flags that affect the mapping of a [`MemoryRegion`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MemoryFlags(pub u64);

impl MemoryFlags {
    /// The region is readable.
    pub const READ: Self = Self(0x0001);
    /// The region is writable.
    pub const WRITE: Self = Self(0x0002);
    /// The region is executable.
    pub const EXECUTE: Self = Self(0x0004);
    /// The region may be used for DMA.
    pub const DMA: Self = Self(0x0008);
    /// The region is an I/O region.
    pub const IO: Self = Self(0x0010);
    /// The region holds the communication region of the cell.
    pub const COMM_REGION: Self = Self(0x0020);
    /// The region is loadable by the root cell.
    pub const LOADABLE: Self = Self(0x0040);
    /// The region is shared with the root cell.
    pub const ROOTSHARED: Self = Self(0x0080);
    /// The region must not be mapped with huge pages.
    pub const NO_HUGEPAGES: Self = Self(0x0100);
    /// The region uses cache coloring.
    pub const COLORED: Self = Self(0x0200);
    /// The region uses cache coloring without copying contents.
    pub const COLORED_NO_COPY: Self = Self(0x0400);
    /// The region allows unaligned I/O access.
    pub const IO_UNALIGNED: Self = Self(0x8000);

    /// The shift of the I/O access width bits.
    pub const IO_WIDTH_SHIFT: u32 = 16;
    /// The region allows 8-bit I/O access.
    pub const IO_8: Self = Self(1 << Self::IO_WIDTH_SHIFT);
    /// The region allows 16-bit I/O access.
    pub const IO_16: Self = Self(2 << Self::IO_WIDTH_SHIFT);
    /// The region allows 32-bit I/O access.
    pub const IO_32: Self = Self(4 << Self::IO_WIDTH_SHIFT);
    /// The region allows 64-bit I/O access.
    pub const IO_64: Self = Self(8 << Self::IO_WIDTH_SHIFT);
}

/// A cache region assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CacheRegion {
    /// The first cache unit of the region.
    pub start: u32,
    /// The number of cache units in the region.
    pub size: u32,
    /// The type of cache the region describes.
    pub kind: CacheType,
    /// Reserved.
    pub padding: u8,
    /// Flags that affect the cache region.
    pub flags: CacheFlags,
}

/// The type of cache a [`CacheRegion`] describes.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CacheType(pub u8);

impl CacheType {
    /// The L3 code cache.
    pub const L3_CODE: Self = Self(0x01);
    /// The L3 data cache.
    pub const L3_DATA: Self = Self(0x02);
    /// The unified L3 cache.
    pub const L3: Self = Self(Self::L3_CODE.0 | Self::L3_DATA.0);
}

/// Flags that affect a [`CacheRegion`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct CacheFlags(pub u16);

impl CacheFlags {
    /// The cache region is shared with the root cell.
    pub const ROOTSHARED: Self = Self(0x0001);
}

/// An interrupt chip assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Irqchip {
    /// The base address of the interrupt chip.
    pub address: u64,
    /// The id of the interrupt chip.
    pub id: u32,
    /// The number of the first interrupt pin covered by `pin_bitmap`.
    pub pin_base: u32,
    /// A bitmap of the interrupt pins assigned to the cell.
    pub pin_bitmap: [u32; 4],
}

/// A port I/O range assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PioRegion {
    /// The first port of the range.
    pub base: u16,
    /// The number of ports in the range.
    pub length: u16,
}

/// A PCI device assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PciDevice {
    /// The type of the PCI device.
    pub kind: PciType,
    /// The index of the IOMMU unit the device is attached to.
    pub iommu: u8,
    /// The PCI domain of the device.
    pub domain: u16,
    /// The bus/device/function number of the device.
    pub bdf: u16,
    /// The BAR access masks of the device.
    pub bar_mask: [u32; 6],
    /// The index of the first [`PciCapability`] record of the device.
    pub caps_start: u16,
    /// The number of [`PciCapability`] records of the device.
    pub num_caps: u16,
    /// The number of MSI vectors of the device.
    pub num_msi_vectors: u8,
    /// Bit-packed MSI properties; use [`PciDevice::msi_64bits`] and
    /// [`PciDevice::msi_maskable`].
    pub msi_flags: u8,
    /// The number of MSI-X vectors of the device.
    pub num_msix_vectors: u16,
    /// The size, in bytes, of the MSI-X region of the device.
    pub msix_region_size: u16,
    /// The address of the MSI-X region of the device.
    pub msix_address: u64,
    /// The index of the first shared memory region of the device.
    ///
    /// Only meaningful for ivshmem devices.
    pub shmem_regions_start: u32,
    /// The id of the device within its shared memory group.
    pub shmem_dev_id: u8,
    /// The number of peers in the shared memory group of the device.
    pub shmem_peers: u8,
    /// The protocol spoken over the shared memory of the device.
    pub shmem_protocol: u16,
}

impl PciDevice {
    /// Bit in `msi_flags` set when the device supports 64-bit MSI addresses.
    pub const MSI_64BITS: u8 = 1 << 0;
    /// Bit in `msi_flags` set when the MSI vectors of the device are
    /// maskable.
    pub const MSI_MASKABLE: u8 = 1 << 1;

    /// Returns whether the device supports 64-bit MSI addresses.
    pub const fn msi_64bits(&self) -> bool {
        self.msi_flags & Self::MSI_64BITS != 0
    }

    /// Returns whether the MSI vectors of the device are maskable.
    pub const fn msi_maskable(&self) -> bool {
        self.msi_flags & Self::MSI_MASKABLE != 0
    }
}

/// The type of a [`PciDevice`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PciType(pub u8);

impl PciType {
    /// An ordinary PCI device.
    pub const DEVICE: Self = Self(0x01);
    /// A PCI bridge.
    pub const BRIDGE: Self = Self(0x02);
    /// A virtual ivshmem device.
    pub const IVSHMEM: Self = Self(0x03);
}

/// The protocol spoken over the shared memory of an ivshmem device.
pub mod shmem_proto {
    /// No defined protocol.
    pub const UNDEFINED: u16 = 0x0000;
    /// The virtual ethernet protocol.
    pub const VETH: u16 = 0x0001;
    /// The first custom protocol number.
    pub const CUSTOM: u16 = 0x4000;
    /// The first virtio front-end protocol number.
    pub const VIRTIO_FRONT: u16 = 0x8000;
    /// The first virtio back-end protocol number.
    pub const VIRTIO_BACK: u16 = 0xc000;
}

/// A capability of a [`PciDevice`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PciCapability {
    /// The id of the capability.
    ///
    /// Extended capabilities have [`PciCapability::EXT_CAP`] set.
    pub id: u16,
    /// The offset of the capability in the configuration space of the
    /// device.
    pub start: u16,
    /// The length, in bytes, of the capability.
    pub len: u16,
    /// Flags that affect access to the capability.
    pub flags: PciCapFlags,
}

impl PciCapability {
    /// Bit in `id` marking an extended capability.
    pub const EXT_CAP: u16 = 0x8000;
}

/// Flags that affect access to a [`PciCapability`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PciCapFlags(pub u16);

impl PciCapFlags {
    /// The capability is writable by the cell.
    pub const WRITE: Self = Self(0x0001);
}

/// A stream id assigned to a cell.
///
/// On platforms with an ARM MMU-500, the entry packs a stream id and an
/// output mask; use [`StreamId::mmu500_id`] and [`StreamId::mmu500_mask_out`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct StreamId(pub u32);

impl StreamId {
    /// The stream id half of an MMU-500 entry.
    pub const fn mmu500_id(self) -> u16 {
        self.0 as u16
    }

    /// The mask of ignored stream id bits of an MMU-500 entry.
    pub const fn mmu500_mask_out(self) -> u16 {
        (self.0 >> 16) as u16
    }
}

/// A QoS-capable device assigned to a cell.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct QosDevice {
    /// The name of the device.
    pub name: [u8; 15],
    /// Flags describing the QoS capabilities of the device.
    pub flags: QosDeviceFlags,
    /// The offset of the QoS registers of the device from the start of the
    /// network interconnect register region.
    pub base: u32,
}

/// Flags describing the QoS capabilities of a [`QosDevice`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct QosDeviceFlags(pub u8);

impl QosDeviceFlags {
    /// The device supports read/write QoS priorities.
    pub const HAS_RWQOS: Self = Self(1 << 0);
    /// The device supports bandwidth regulation.
    pub const HAS_REGUL: Self = Self(1 << 1);
    /// The device supports dynamic QoS.
    pub const HAS_DYNQOS: Self = Self(1 << 2);
}

/// An IOMMU unit of the platform.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct IommuUnit {
    /// The type of the IOMMU unit.
    pub kind: IommuType,
    /// The base address of the IOMMU unit.
    pub base: u64,
    /// The size, in bytes, of the register region of the IOMMU unit.
    pub size: u32,
    /// Type-specific payload; an [`AmdIommu`] or [`TipvuIommu`] view
    /// occupies its leading bytes.
    pub variant: [u8; IOMMU_VARIANT_SIZE],
}

/// The type of an [`IommuUnit`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct IommuType(pub u32);

impl IommuType {
    /// An AMD IOMMU.
    pub const AMD: Self = Self(1);
    /// An Intel VT-d IOMMU.
    pub const INTEL: Self = Self(2);
    /// An ARM SMMUv3.
    pub const SMMUV3: Self = Self(3);
    /// A TI peripheral virtualization unit.
    pub const PVU: Self = Self(4);
    /// An ARM MMU-500.
    pub const ARM_MMU500: Self = Self(5);
}

/// The AMD view of the variant payload of an [`IommuUnit`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct AmdIommu {
    /// The bus/device/function number of the IOMMU.
    pub bdf: u16,
    /// The offset of the base capability of the IOMMU.
    pub base_cap: u8,
    /// The offset of the MSI capability of the IOMMU.
    pub msi_cap: u8,
    /// The feature report of the IOMMU.
    pub features: u32,
}

/// The TI-PVU view of the variant payload of an [`IommuUnit`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TipvuIommu {
    /// The base address of the TLB of the unit.
    pub tlb_base: u64,
    /// The size, in bytes, of the TLB of the unit.
    pub tlb_size: u32,
}

/// The cache coloring description of the platform.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Coloring {
    /// The size, in bytes, of one cache way.
    pub way_size: u64,
    /// The virtual offset at which colored regions of the root cell are
    /// remapped.
    pub root_map_offset: u64,
}

/// The memguard configuration of the platform.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MemguardConfig {
    /// The total number of interrupts handled by memguard.
    pub num_irqs: u32,
    /// The interrupt number of the hypervisor timer.
    pub hv_timer: u32,
    /// The minimum interrupt priority.
    pub irq_prio_min: u8,
    /// The maximum interrupt priority.
    pub irq_prio_max: u8,
    /// The step between interrupt priorities.
    pub irq_prio_step: u8,
    /// The priority threshold of memguard interrupts.
    pub irq_prio_threshold: u8,
    /// The number of PMU interrupts.
    pub num_pmu_irq: u32,
    /// The PMU interrupt number of each CPU.
    pub pmu_cpu_irq: [u32; MAX_PMU2CPU_IRQ],
}

/// The QoS interconnect description of the platform.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct QosConfig {
    /// The base address of the network interconnect register region.
    pub nic_base: u64,
    /// The size, in bytes, of the network interconnect register region.
    pub nic_size: u64,
}

/// The platform information block of a system descriptor.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PlatformInfo {
    /// The base address of the PCI mmconfig region.
    pub pci_mmconfig_base: u64,
    /// The last bus covered by the PCI mmconfig region.
    pub pci_mmconfig_end_bus: u8,
    /// Whether the PCI controller is virtual.
    pub pci_is_virtual: u8,
    /// The PCI domain of the platform.
    pub pci_domain: u16,
    /// Whether Spectre mitigations are disabled.
    pub no_spectre_mitigation: u32,
    /// The IOMMU units of the platform; unused slots are zeroed.
    pub iommu_units: [IommuUnit; MAX_IOMMU_UNITS],
    /// The cache coloring description of the platform.
    pub color: Coloring,
    /// The memguard configuration of the platform.
    pub memguard: MemguardConfig,
    /// The QoS interconnect description of the platform.
    pub qos: QosConfig,
    /// The architecture-specific payload, opaque to the codec.
    ///
    /// An [`X86ArchInfo`] or [`ArmArchInfo`] view occupies its leading
    /// bytes, selected by the target architecture.
    pub arch: [u8; ARCH_INFO_SIZE],
}

/// The x86 view of the architecture-specific payload of [`PlatformInfo`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct X86ArchInfo {
    /// The port address of the ACPI PM timer.
    pub pm_timer_address: u16,
    /// The APIC mode to use.
    pub apic_mode: u8,
    /// Reserved.
    pub padding: u8,
    /// The interrupt limit of the VT-d interrupt remapping unit.
    pub vtd_interrupt_limit: u32,
    /// The TSC frequency, in kHz.
    pub tsc_khz: u32,
    /// The APIC timer frequency, in kHz.
    pub apic_khz: u32,
}

/// The APIC mode of the platform.
pub mod apic_mode {
    /// Pick the APIC mode automatically.
    pub const AUTO: u8 = 0;
    /// Use xAPIC mode.
    pub const XAPIC: u8 = 1;
    /// Use x2APIC mode.
    pub const X2APIC: u8 = 2;
}

/// The ARM view of the architecture-specific payload of [`PlatformInfo`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ArmArchInfo {
    /// The interrupt number of the GIC maintenance interrupt.
    pub maintenance_irq: u8,
    /// The version of the GIC.
    pub gic_version: u8,
    /// Reserved.
    pub padding: [u8; 2],
    /// The base address of the GIC distributor.
    pub gicd_base: u64,
    /// The base address of the GIC CPU interface.
    pub gicc_base: u64,
    /// The base address of the GIC hypervisor interface.
    pub gich_base: u64,
    /// The base address of the GIC virtual CPU interface.
    pub gicv_base: u64,
    /// The base address of the GIC redistributors.
    pub gicr_base: u64,
}

/// The fixed part of a system descriptor.
///
/// The trailing sections of the root cell follow `root_cell` per the cell
/// descriptor rules.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SystemDesc {
    /// Must equal [`SYSTEM_SIGNATURE`].
    pub signature: [u8; 6],
    /// Must equal [`CONFIG_REVISION`].
    pub revision: u16,
    /// Flags that affect the entire system.
    pub flags: SystemFlags,
    /// The memory region reserved for the hypervisor itself.
    pub hypervisor_memory: MemoryRegion,
    /// The console the hypervisor uses for debug output.
    pub debug_console: Console,
    /// The platform information block.
    pub platform_info: PlatformInfo,
    /// The descriptor of the root cell.
    pub root_cell: CellDesc,
}

/// Flags that affect an entire system.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SystemFlags(pub u32);

impl SystemFlags {
    /// The root cell may read from the virtual debug console.
    pub const VIRTUAL_DEBUG_CONSOLE: Self = Self(0x0001);

    /// Returns whether the root cell may read from the virtual debug
    /// console.
    pub const fn virtual_debug_console(self) -> bool {
        self.0 & Self::VIRTUAL_DEBUG_CONSOLE.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use core::mem;

    use super::*;

    #[test]
    fn record_sizes_match_format() {
        assert_eq!(mem::size_of::<Console>(), 32);
        assert_eq!(mem::size_of::<CellDesc>(), 136);
        assert_eq!(mem::size_of::<MemoryRegion>(), 40);
        assert_eq!(mem::size_of::<CacheRegion>(), 12);
        assert_eq!(mem::size_of::<Irqchip>(), 32);
        assert_eq!(mem::size_of::<PioRegion>(), 4);
        assert_eq!(mem::size_of::<PciDevice>(), 56);
        assert_eq!(mem::size_of::<PciCapability>(), 8);
        assert_eq!(mem::size_of::<StreamId>(), 4);
        assert_eq!(mem::size_of::<QosDevice>(), 20);
        assert_eq!(mem::size_of::<IommuUnit>(), 28);
        assert_eq!(mem::size_of::<Coloring>(), 16);
        assert_eq!(mem::size_of::<MemguardConfig>(), 48);
        assert_eq!(mem::size_of::<QosConfig>(), 16);
        assert_eq!(mem::size_of::<PlatformInfo>(), 364);
        assert_eq!(mem::size_of::<SystemDesc>(), 448 + 136);
    }

    #[test]
    fn arch_views_fit_payload() {
        assert_eq!(mem::size_of::<ArmArchInfo>(), ARCH_INFO_SIZE);
        assert!(mem::size_of::<X86ArchInfo>() <= ARCH_INFO_SIZE);
        assert!(mem::size_of::<AmdIommu>() <= IOMMU_VARIANT_SIZE);
        assert_eq!(mem::size_of::<TipvuIommu>(), IOMMU_VARIANT_SIZE);
    }

    #[test]
    fn header_field_offsets() {
        assert_eq!(mem::offset_of!(CellDesc, name), 8);
        assert_eq!(mem::offset_of!(CellDesc, cpu_set_size), 48);
        assert_eq!(mem::offset_of!(CellDesc, num_qos_devices), 80);
        assert_eq!(mem::offset_of!(CellDesc, console), 104);
        assert_eq!(mem::offset_of!(SystemDesc, platform_info), 84);
        assert_eq!(mem::offset_of!(SystemDesc, root_cell), 448);
    }

    #[test]
    fn bit_mask_accessors() {
        assert!(CellFlags(0x8000_0000).virtual_console_active());
        assert!(!CellFlags(0x4000_0000).virtual_console_active());
        assert!(ConsoleFlags(0x0001).is_mmio());
        assert!(ConsoleFlags(0x0000).uses_regdist_1());
        assert!(!ConsoleFlags(0x0002).uses_regdist_1());

        let device = PciDevice {
            kind: PciType::DEVICE,
            iommu: 0,
            domain: 0,
            bdf: 0,
            bar_mask: [0; 6],
            caps_start: 0,
            num_caps: 0,
            num_msi_vectors: 0,
            msi_flags: PciDevice::MSI_64BITS | PciDevice::MSI_MASKABLE,
            num_msix_vectors: 0,
            msix_region_size: 0,
            msix_address: 0,
            shmem_regions_start: 0,
            shmem_dev_id: 0,
            shmem_peers: 0,
            shmem_protocol: shmem_proto::UNDEFINED,
        };
        assert!(device.msi_64bits());
        assert!(device.msi_maskable());

        assert_eq!(StreamId(0xabcd_1234).mmu500_id(), 0x1234);
        assert_eq!(StreamId(0xabcd_1234).mmu500_mask_out(), 0xabcd);
    }
}
