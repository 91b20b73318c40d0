//! mtdscan-legacy - MTD discovery for kernels without MTD sysfs
//!
//! Linux kernels before 2.6.30 did not export MTD devices through
//! `/sys/class/mtd`. On those kernels the only device list is `/proc/mtd`,
//! which carries each device's number, size, eraseblock size and name:
//!
//! ```text
//! dev:    size   erasesize  name
//! mtd0: 00040000 00020000 "u-boot"
//! mtd1: 07fc0000 00020000 "rootfs"
//! ```
//!
//! Everything else (type, page size, OOB size, bad block support) has to be
//! asked from the `/dev/mtdN` character node with ioctls. This crate merges
//! both sources into one [`DeviceDescriptor`] per device.
//!
//! # Example
//!
//! ```ignore
//! use mtdscan_legacy::LegacyMtd;
//!
//! let mtd = LegacyMtd::new();
//! match mtd.summary() {
//!     Ok(summary) => println!("{} MTD devices", summary.dev_count),
//!     Err(e) if e.is_unsupported_kernel() => println!("no /proc/mtd, use sysfs"),
//!     Err(e) => return Err(e.into()),
//! }
//!
//! let info = mtd.dev_info_by_name("rootfs")?;
//! println!("mtd{}: {} eraseblocks of {} bytes", info.mtd_num, info.eb_cnt, info.eb_size);
//! ```
//!
//! # Limitations
//!
//! - The sub-page size is not available on these kernels and is reported as
//!   the minimum I/O unit size.
//! - Device nodes are not created by this crate; `/dev/mtdN` must exist with
//!   major 90 and minor `2 * N`.
//! - Nothing is cached. Every query re-reads `/proc/mtd`.

pub mod config;
pub mod describe;
pub mod discovery;
pub mod error;
pub mod ioctl;
pub mod node;
pub mod oob;
pub mod procfs;

// Re-exports
pub use config::{parse_options, LegacyMtdConfig};
pub use describe::{describe, describe_with};
pub use discovery::LegacyMtd;
pub use error::{LegacyMtdError, Result};
pub use mtdscan_core::{DeviceDescriptor, DeviceSummary, DeviceType};
pub use node::{MtdControl, MtdNode};
pub use oob::{oob_avail, probe_oob};
pub use procfs::{procfs_is_supported, ProcScan};

/// Build a discovery handle from programmer-style options
///
/// # Example Options
///
/// - `proc=/proc/mtd` - status report path
/// - `devdir=/dev` - device node directory
pub fn open_legacy_mtd(options: &[(&str, &str)]) -> Result<LegacyMtd> {
    let config = parse_options(options)?;
    Ok(LegacyMtd::with_config(config))
}
