//! Device descriptor assembly
//!
//! Numeric attributes come from ioctls on the device node, the name from
//! `/proc/mtd`. The name lookup runs last so that a broken report never hides
//! a more specific attribute error.

use std::path::Path;

use log::{debug, warn};
use mtdscan_core::{DeviceDescriptor, DeviceName, MTD_DEV_MAJOR};

use crate::error::{LegacyMtdError, Result};
use crate::node::{MtdControl, MtdNode};
use crate::oob;
use crate::procfs::ProcScan;

/// Describe the MTD device behind the character node `node_path`
///
/// `proc_path` is the status report used to look up the device name.
///
/// # Errors
/// - [`LegacyMtdError::NodeNotFound`], [`LegacyMtdError::NotCharDevice`] or
///   [`LegacyMtdError::WrongMajor`] if the node is not an MTD device
/// - [`LegacyMtdError::Ioctl`] if `MEMGETINFO` fails, or `MEMGETBADBLOCK`
///   fails with anything other than EOPNOTSUPP
/// - [`LegacyMtdError::InsaneAttributes`] if the geometry or type is invalid
/// - [`LegacyMtdError::NameUnresolved`] if the report does not list the device
pub fn describe(
    node_path: impl AsRef<Path>,
    proc_path: impl AsRef<Path>,
) -> Result<DeviceDescriptor> {
    describe_with(node_path.as_ref(), proc_path.as_ref(), |path| MtdNode::open(path))
}

/// Describe a device whose node is opened by `open`
///
/// `open` is called twice: once for the attribute requests and once more,
/// after the first handle is closed, for the OOB layout.
pub fn describe_with<D, F>(
    node_path: &Path,
    proc_path: &Path,
    open: F,
) -> Result<DeviceDescriptor>
where
    D: MtdControl,
    F: Fn(&Path) -> Result<D>,
{
    let node = open(node_path)?;

    let major = node.major();
    let minor = node.minor();
    if major != MTD_DEV_MAJOR {
        return Err(LegacyMtdError::WrongMajor {
            path: node_path.to_path_buf(),
            major,
            expected: MTD_DEV_MAJOR,
        });
    }
    let mtd_num = minor / 2;

    let raw = node.get_info()?;
    let bad_blocks_allowed = node.bad_block_support()?.is_supported();
    if !bad_blocks_allowed {
        debug!("mtd{}: bad block reporting not supported", mtd_num);
    }

    let mut desc =
        DeviceDescriptor::from_raw(major, minor, &raw, bad_blocks_allowed).map_err(|source| {
            if raw.is_absent() {
                warn!(
                    "mtd{} ({}) is removable and is not present",
                    mtd_num,
                    node_path.display()
                );
            }
            LegacyMtdError::InsaneAttributes {
                mtd_num,
                path: node_path.to_path_buf(),
                source,
            }
        })?;

    drop(node);

    desc.oob_avail = match open(node_path).and_then(|node| oob::oob_avail(&node)) {
        Ok(avail) => avail,
        Err(e) => {
            warn!("mtd{}: cannot get OOB layout, assuming none: {}", mtd_num, e);
            0
        }
    };

    desc.name = resolve_name(proc_path, mtd_num)?;

    debug!(
        "mtd{}: name='{}', type={}, size={}, eb_size={}, min_io_size={}, oob_avail={}",
        desc.mtd_num,
        desc.name,
        desc.device_type,
        desc.size,
        desc.eb_size,
        desc.min_io_size,
        desc.oob_avail
    );

    Ok(desc)
}

/// Find the name of device `mtd_num` in the status report
///
/// The first matching line wins.
pub fn resolve_name(proc_path: impl AsRef<Path>, mtd_num: u32) -> Result<DeviceName> {
    let mut scan = ProcScan::open(proc_path.as_ref())?;
    while let Some(record) = scan.advance()? {
        if record.mtd_num == mtd_num {
            return Ok(record.name);
        }
    }

    Err(LegacyMtdError::NameUnresolved {
        mtd_num,
        path: proc_path.as_ref().to_path_buf(),
    })
}
