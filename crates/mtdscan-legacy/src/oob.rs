//! OOB area probing

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::node::{MtdControl, MtdNode};

/// Number of OOB bytes per page available to users
///
/// Issues `ECCGETLAYOUT` on the node at `path`. Devices without an ECC
/// layout (NOR, RAM, most non-NAND drivers) answer EOPNOTSUPP, which is
/// reported as 0 rather than as an error.
pub fn probe_oob(path: impl AsRef<Path>) -> Result<u32> {
    let node = MtdNode::open(path)?;
    oob_avail(&node)
}

/// Same as [`probe_oob`] on an already opened node
pub fn oob_avail<D: MtdControl>(node: &D) -> Result<u32> {
    let layout = node.ecc_layout()?;
    if !layout.is_supported() {
        debug!(
            "{}: ECCGETLAYOUT not supported, assuming no OOB area",
            node.path().display()
        );
    }
    Ok(layout.map(|l| l.oobavail).unwrap_or(0))
}
