//! MTD ioctl definitions
//!
//! Layouts match `struct mtd_info_user` and `struct nand_ecclayout_user`
//! from `mtd/mtd-abi.h`.

use mtdscan_core::{MtdFlags, RawDeviceInfo};
use nix::errno::Errno;

/// Magic number of the MTD ioctls
const MTD_IOC_MAGIC: u8 = b'M';

/// `struct mtd_info_user`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct MtdInfoUser {
    pub mtd_type: u8,
    pub flags: u32,
    pub size: u32,
    pub erasesize: u32,
    pub writesize: u32,
    pub oobsize: u32,
    pub padding: u64,
}

impl From<&MtdInfoUser> for RawDeviceInfo {
    fn from(info: &MtdInfoUser) -> Self {
        Self {
            mtd_type: info.mtd_type,
            flags: MtdFlags::from_bits_retain(info.flags),
            size: info.size.into(),
            erasesize: info.erasesize,
            writesize: info.writesize,
            oobsize: info.oobsize,
        }
    }
}

/// `struct nand_oobfree`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NandOobFree {
    pub offset: u32,
    pub length: u32,
}

/// `struct nand_ecclayout_user`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NandEccLayoutUser {
    pub eccbytes: u32,
    pub eccpos: [u32; 64],
    pub oobavail: u32,
    pub oobfree: [NandOobFree; 8],
}

impl Default for NandEccLayoutUser {
    fn default() -> Self {
        Self {
            eccbytes: 0,
            eccpos: [0; 64],
            oobavail: 0,
            oobfree: [NandOobFree::default(); 8],
        }
    }
}

// MEMGETINFO = _IOR('M', 1, struct mtd_info_user)
nix::ioctl_read!(memgetinfo, MTD_IOC_MAGIC, 1, MtdInfoUser);
// MEMGETBADBLOCK = _IOW('M', 11, __kernel_loff_t)
nix::ioctl_write_ptr!(memgetbadblock, MTD_IOC_MAGIC, 11, i64);
// ECCGETLAYOUT = _IOR('M', 17, struct nand_ecclayout_user)
nix::ioctl_read!(eccgetlayout, MTD_IOC_MAGIC, 17, NandEccLayoutUser);

/// Outcome of an ioctl the kernel may legitimately not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    /// The request succeeded
    Supported(T),
    /// The kernel returned EOPNOTSUPP
    Unsupported,
}

impl<T> Probe<T> {
    /// Transform the answer of a supported request
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Self::Supported(value) => Probe::Supported(f(value)),
            Self::Unsupported => Probe::Unsupported,
        }
    }

    /// Collapse to the answer, substituting `default` when unsupported
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Supported(value) => value,
            Self::Unsupported => default,
        }
    }

    /// Returns true if the request succeeded
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

/// Turn EOPNOTSUPP into [`Probe::Unsupported`], pass other errors through
pub fn soft<T>(result: nix::Result<T>) -> nix::Result<Probe<T>> {
    match result {
        Ok(value) => Ok(Probe::Supported(value)),
        Err(Errno::EOPNOTSUPP) => Ok(Probe::Unsupported),
        Err(errno) => Err(errno),
    }
}
