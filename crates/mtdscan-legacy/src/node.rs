//! MTD character device nodes

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;
use mtdscan_core::RawDeviceInfo;
use nix::sys::stat::{major, minor};

use crate::error::{LegacyMtdError, Result};
use crate::ioctl::{self, MtdInfoUser, NandEccLayoutUser, Probe};

/// An open MTD character device
///
/// The node is opened read-only and closed when this value is dropped.
#[derive(Debug)]
pub struct MtdNode {
    file: File,
    path: PathBuf,
    rdev: u64,
}

impl MtdNode {
    /// Open `path` and check that it is a character device
    ///
    /// # Errors
    /// - [`LegacyMtdError::NodeNotFound`] if the path does not exist
    /// - [`LegacyMtdError::OpenFailed`] / [`LegacyMtdError::StatFailed`] on
    ///   other I/O failures
    /// - [`LegacyMtdError::NotCharDevice`] if it is not a character device
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => LegacyMtdError::NodeNotFound {
                    path: path.to_path_buf(),
                },
                _ => LegacyMtdError::OpenFailed {
                    path: path.to_path_buf(),
                    source: e,
                },
            })?;

        let meta = file.metadata().map_err(|e| LegacyMtdError::StatFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !meta.file_type().is_char_device() {
            return Err(LegacyMtdError::NotCharDevice {
                path: path.to_path_buf(),
            });
        }

        debug!("Opened {} (rdev {:#x})", path.display(), meta.rdev());

        Ok(Self {
            file,
            path: path.to_path_buf(),
            rdev: meta.rdev(),
        })
    }

    fn ioctl_error(&self, request: &'static str, source: nix::errno::Errno) -> LegacyMtdError {
        LegacyMtdError::Ioctl {
            request,
            path: self.path.clone(),
            source,
        }
    }
}

/// Device-control requests the descriptor builder needs from an MTD node
pub trait MtdControl {
    /// Node path
    fn path(&self) -> &Path;

    /// Character device major number
    fn major(&self) -> u32;

    /// Character device minor number
    fn minor(&self) -> u32;

    /// Issue `MEMGETINFO`
    fn get_info(&self) -> Result<RawDeviceInfo>;

    /// Ask whether the kernel can report bad eraseblocks
    fn bad_block_support(&self) -> Result<Probe<()>>;

    /// Issue `ECCGETLAYOUT`
    fn ecc_layout(&self) -> Result<Probe<NandEccLayoutUser>>;
}

impl MtdControl for MtdNode {
    fn path(&self) -> &Path {
        &self.path
    }

    fn major(&self) -> u32 {
        major(self.rdev as libc::dev_t) as u32
    }

    fn minor(&self) -> u32 {
        minor(self.rdev as libc::dev_t) as u32
    }

    fn get_info(&self) -> Result<RawDeviceInfo> {
        let mut info = MtdInfoUser::default();
        // SAFETY: the fd is open for the lifetime of self and `info` matches
        // the kernel's struct mtd_info_user
        unsafe { ioctl::memgetinfo(self.file.as_raw_fd(), &mut info) }
            .map_err(|e| self.ioctl_error("MEMGETINFO", e))?;
        Ok(RawDeviceInfo::from(&info))
    }

    /// Issues `MEMGETBADBLOCK` for offset 0; the answer about block 0 itself
    /// is discarded
    fn bad_block_support(&self) -> Result<Probe<()>> {
        let offs: i64 = 0;
        // SAFETY: the fd is open and `offs` is a valid loff_t the kernel only reads
        let result = unsafe { ioctl::memgetbadblock(self.file.as_raw_fd(), &offs) };
        ioctl::soft(result.map(drop)).map_err(|e| self.ioctl_error("MEMGETBADBLOCK", e))
    }

    fn ecc_layout(&self) -> Result<Probe<NandEccLayoutUser>> {
        let mut layout = NandEccLayoutUser::default();
        // SAFETY: the fd is open and `layout` matches struct nand_ecclayout_user
        let result = unsafe { ioctl::eccgetlayout(self.file.as_raw_fd(), &mut layout) };
        ioctl::soft(result.map(|_| layout)).map_err(|e| self.ioctl_error("ECCGETLAYOUT", e))
    }
}
