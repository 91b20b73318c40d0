//! MTD device model
//!
//! The types here mirror what the kernel reports about an MTD device through
//! the `MEMGETINFO` ioctl, plus the name that only `/proc/mtd` carries.

use core::fmt;
use core::ops::RangeInclusive;

use bitflags::bitflags;

use crate::error::{Attribute, Error, Result};

/// Character device major number of MTD nodes (`/dev/mtdN`)
pub const MTD_DEV_MAJOR: u32 = 90;

/// Maximum length of an MTD device name in bytes
pub const MTD_NAME_MAX: usize = 127;

/// Bounded device name as reported by `/proc/mtd`
pub type DeviceName = heapless::String<MTD_NAME_MAX>;

/// Raw MTD type codes from `mtd/mtd-abi.h`
pub mod mtd_types {
    /// Removable device that is not present
    pub const MTD_ABSENT: u8 = 0;
    /// RAM-backed device
    pub const MTD_RAM: u8 = 1;
    /// ROM
    pub const MTD_ROM: u8 = 2;
    /// NOR flash
    pub const MTD_NORFLASH: u8 = 3;
    /// SLC NAND flash
    pub const MTD_NANDFLASH: u8 = 4;
    /// Atmel DataFlash
    pub const MTD_DATAFLASH: u8 = 6;
    /// UBI volume emulated on top of MTD (gluebi)
    pub const MTD_UBIVOLUME: u8 = 7;
    /// MLC NAND flash
    pub const MTD_MLCNANDFLASH: u8 = 8;
}

bitflags! {
    /// MTD device flags from `mtd/mtd-abi.h`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MtdFlags: u32 {
        /// Device is writable
        const WRITEABLE    = 0x400;
        /// Single bits can be flipped
        const BIT_WRITEABLE = 0x800;
        /// Device does not need to be erased before writing
        const NO_ERASE     = 0x1000;
        /// Device is always locked after reset
        const POWERUP_LOCK = 0x2000;
    }
}

/// Kind of MTD device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceType {
    /// RAM-backed device
    Ram,
    /// ROM
    Rom,
    /// NOR flash
    Nor,
    /// SLC NAND flash
    Nand,
    /// MLC NAND flash
    MlcNand,
    /// Atmel DataFlash
    DataFlash,
    /// UBI volume emulated on top of MTD
    UbiVolume,
}

impl DeviceType {
    /// Map a raw kernel type code to a device type
    ///
    /// Returns `None` for `MTD_ABSENT` and for codes this crate does not know.
    pub const fn from_raw(code: u8) -> Option<Self> {
        match code {
            mtd_types::MTD_RAM => Some(Self::Ram),
            mtd_types::MTD_ROM => Some(Self::Rom),
            mtd_types::MTD_NORFLASH => Some(Self::Nor),
            mtd_types::MTD_NANDFLASH => Some(Self::Nand),
            mtd_types::MTD_MLCNANDFLASH => Some(Self::MlcNand),
            mtd_types::MTD_DATAFLASH => Some(Self::DataFlash),
            mtd_types::MTD_UBIVOLUME => Some(Self::UbiVolume),
            _ => None,
        }
    }

    /// Short name used by the kernel and the mtd-utils tools
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Rom => "rom",
            Self::Nor => "nor",
            Self::Nand => "nand",
            Self::MlcNand => "mlc-nand",
            Self::DataFlash => "dataflash",
            Self::UbiVolume => "ubi",
        }
    }

    /// Returns true for NAND flavours, which have an OOB area and bad blocks
    pub const fn is_nand(&self) -> bool {
        matches!(self, Self::Nand | Self::MlcNand)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric device attributes as returned by `MEMGETINFO`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDeviceInfo {
    /// Raw type code (see [`mtd_types`])
    pub mtd_type: u8,
    /// Device flags
    pub flags: MtdFlags,
    /// Total size in bytes
    pub size: u64,
    /// Eraseblock size in bytes
    pub erasesize: u32,
    /// Minimum I/O unit (page) size in bytes
    pub writesize: u32,
    /// OOB bytes per page
    pub oobsize: u32,
}

impl RawDeviceInfo {
    /// Check the geometry invariants
    ///
    /// The checks run in a fixed order: min. I/O unit size, eraseblock size,
    /// then total size. The first violation is returned.
    pub fn validate(&self) -> Result<()> {
        if self.writesize == 0 {
            return Err(insane(Attribute::MinIoUnitSize, self.writesize.into()));
        }
        if self.erasesize == 0 || self.erasesize < self.writesize {
            return Err(insane(Attribute::EraseBlockSize, self.erasesize.into()));
        }
        if self.size == 0 || self.size < u64::from(self.erasesize) {
            return Err(insane(Attribute::TotalSize, self.size));
        }
        Ok(())
    }

    /// Decode the type code, rejecting absent and unknown devices
    pub fn device_type(&self) -> Result<DeviceType> {
        DeviceType::from_raw(self.mtd_type)
            .ok_or_else(|| insane(Attribute::DeviceType, self.mtd_type.into()))
    }

    /// Returns true if the kernel reported a removable device that is not present
    pub fn is_absent(&self) -> bool {
        self.mtd_type == mtd_types::MTD_ABSENT
    }
}

fn insane(field: Attribute, value: u64) -> Error {
    Error::InsaneAttribute { field, value }
}

/// Full description of one MTD device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDescriptor {
    /// Device number (N in `/dev/mtdN`)
    pub mtd_num: u32,
    /// Character device major number
    pub major: u32,
    /// Character device minor number
    pub minor: u32,
    /// Device type
    pub device_type: DeviceType,
    /// Device name
    pub name: DeviceName,
    /// Total size in bytes
    pub size: u64,
    /// Eraseblock size in bytes
    pub eb_size: u32,
    /// Number of eraseblocks
    pub eb_cnt: u64,
    /// Minimum I/O unit size in bytes
    pub min_io_size: u32,
    /// Sub-page size in bytes
    ///
    /// Old kernels do not export it, so it always equals `min_io_size`.
    pub subpage_size: u32,
    /// OOB bytes per page as reported by `MEMGETINFO`
    pub oob_size: u32,
    /// OOB bytes per page available to users (0 if unknown)
    pub oob_avail: u32,
    /// Whether the device is writable
    pub writable: bool,
    /// Whether the kernel can report bad eraseblocks for this device
    pub bad_blocks_allowed: bool,
}

impl DeviceDescriptor {
    /// Build a descriptor from the raw attributes of a device node
    ///
    /// The name is left empty and `oob_avail` is zero; both come from other
    /// sources and are filled in by the caller. `major` must be
    /// [`MTD_DEV_MAJOR`].
    pub fn from_raw(
        major: u32,
        minor: u32,
        raw: &RawDeviceInfo,
        bad_blocks_allowed: bool,
    ) -> Result<Self> {
        if major != MTD_DEV_MAJOR {
            return Err(Error::WrongMajor { major });
        }
        raw.validate()?;
        let device_type = raw.device_type()?;

        Ok(Self {
            mtd_num: minor / 2,
            major,
            minor,
            device_type,
            name: DeviceName::new(),
            size: raw.size,
            eb_size: raw.erasesize,
            eb_cnt: raw.size / u64::from(raw.erasesize),
            min_io_size: raw.writesize,
            subpage_size: raw.writesize,
            oob_size: raw.oobsize,
            oob_avail: 0,
            writable: raw.flags.contains(MtdFlags::WRITEABLE),
            bad_blocks_allowed,
        })
    }
}

/// Aggregate view of all MTD devices in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceSummary {
    /// Number of MTD devices
    pub dev_count: u32,
    /// Lowest device number, `u32::MAX` if there are no devices
    pub lowest_mtd_num: u32,
    /// Highest device number, 0 if there are no devices
    pub highest_mtd_num: u32,
}

impl Default for DeviceSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSummary {
    /// Create an empty summary
    pub const fn new() -> Self {
        Self {
            dev_count: 0,
            lowest_mtd_num: u32::MAX,
            highest_mtd_num: 0,
        }
    }

    /// Account for one device
    pub fn add(&mut self, mtd_num: u32) {
        self.dev_count += 1;
        self.lowest_mtd_num = self.lowest_mtd_num.min(mtd_num);
        self.highest_mtd_num = self.highest_mtd_num.max(mtd_num);
    }

    /// Returns true if no device was seen
    pub const fn is_empty(&self) -> bool {
        self.dev_count == 0
    }

    /// Range of device numbers, or `None` if there are no devices
    pub fn range(&self) -> Option<RangeInclusive<u32>> {
        if self.is_empty() {
            None
        } else {
            Some(self.lowest_mtd_num..=self.highest_mtd_num)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nand_128k() -> RawDeviceInfo {
        RawDeviceInfo {
            mtd_type: mtd_types::MTD_NANDFLASH,
            flags: MtdFlags::WRITEABLE,
            size: 0x10_0000,
            erasesize: 0x1_0000,
            writesize: 0x800,
            oobsize: 64,
        }
    }

    #[test]
    fn test_from_raw_nand() {
        let desc = DeviceDescriptor::from_raw(MTD_DEV_MAJOR, 0, &nand_128k(), true).unwrap();
        assert_eq!(desc.mtd_num, 0);
        assert_eq!(desc.device_type, DeviceType::Nand);
        assert_eq!(desc.eb_cnt, 16);
        assert_eq!(desc.min_io_size, 0x800);
        assert_eq!(desc.subpage_size, 0x800);
        assert_eq!(desc.oob_size, 64);
        assert_eq!(desc.oob_avail, 0);
        assert!(desc.writable);
        assert!(desc.bad_blocks_allowed);
        assert!(desc.name.is_empty());
    }

    #[test]
    fn test_mtd_num_from_minor() {
        let desc = DeviceDescriptor::from_raw(MTD_DEV_MAJOR, 7, &nand_128k(), false).unwrap();
        assert_eq!(desc.mtd_num, 3);
        assert_eq!(desc.minor, 7);
    }

    #[test]
    fn test_wrong_major() {
        let err = DeviceDescriptor::from_raw(31, 0, &nand_128k(), true).unwrap_err();
        assert_eq!(err, Error::WrongMajor { major: 31 });
    }

    #[test]
    fn test_read_only_device() {
        let mut raw = nand_128k();
        raw.flags = MtdFlags::empty();
        let desc = DeviceDescriptor::from_raw(MTD_DEV_MAJOR, 0, &raw, false).unwrap();
        assert!(!desc.writable);
    }

    #[test]
    fn test_zero_erasesize_is_insane() {
        let mut raw = nand_128k();
        raw.erasesize = 0;
        assert_eq!(
            raw.validate(),
            Err(Error::InsaneAttribute {
                field: Attribute::EraseBlockSize,
                value: 0
            })
        );
    }

    #[test]
    fn test_validation_order() {
        let mut raw = nand_128k();
        raw.writesize = 0;
        raw.erasesize = 0;
        raw.size = 0;
        assert_eq!(
            raw.validate(),
            Err(Error::InsaneAttribute {
                field: Attribute::MinIoUnitSize,
                value: 0
            })
        );
    }

    #[test]
    fn test_erasesize_smaller_than_writesize() {
        let mut raw = nand_128k();
        raw.erasesize = 0x400;
        assert_eq!(
            raw.validate(),
            Err(Error::InsaneAttribute {
                field: Attribute::EraseBlockSize,
                value: 0x400
            })
        );
    }

    #[test]
    fn test_size_smaller_than_erasesize() {
        let mut raw = nand_128k();
        raw.size = 0x8000;
        assert_eq!(
            raw.validate(),
            Err(Error::InsaneAttribute {
                field: Attribute::TotalSize,
                value: 0x8000
            })
        );
    }

    #[test]
    fn test_absent_and_unknown_types() {
        let mut raw = nand_128k();
        raw.mtd_type = mtd_types::MTD_ABSENT;
        assert!(raw.is_absent());
        assert_eq!(
            DeviceDescriptor::from_raw(MTD_DEV_MAJOR, 0, &raw, false),
            Err(Error::InsaneAttribute {
                field: Attribute::DeviceType,
                value: 0
            })
        );

        // 5 was never assigned by the kernel
        raw.mtd_type = 5;
        assert!(!raw.is_absent());
        assert!(raw.device_type().is_err());
    }

    #[test]
    fn test_geometry_checked_before_type() {
        let mut raw = nand_128k();
        raw.mtd_type = mtd_types::MTD_ABSENT;
        raw.writesize = 0;
        assert_eq!(
            DeviceDescriptor::from_raw(MTD_DEV_MAJOR, 0, &raw, false),
            Err(Error::InsaneAttribute {
                field: Attribute::MinIoUnitSize,
                value: 0
            })
        );
    }

    #[test]
    fn test_device_type_names() {
        assert_eq!(DeviceType::from_raw(3), Some(DeviceType::Nor));
        assert_eq!(DeviceType::from_raw(8), Some(DeviceType::MlcNand));
        assert_eq!(DeviceType::MlcNand.as_str(), "mlc-nand");
        assert_eq!(DeviceType::UbiVolume.as_str(), "ubi");
        assert!(DeviceType::MlcNand.is_nand());
        assert!(!DeviceType::Nor.is_nand());
    }

    #[test]
    fn test_summary() {
        let mut summary = DeviceSummary::new();
        assert!(summary.is_empty());
        assert_eq!(summary.lowest_mtd_num, u32::MAX);
        assert_eq!(summary.range(), None);

        for num in [4, 1, 7] {
            summary.add(num);
        }
        assert_eq!(summary.dev_count, 3);
        assert_eq!(summary.range(), Some(1..=7));
    }
}
