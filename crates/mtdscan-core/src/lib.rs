//! mtdscan-core - Core types for MTD device discovery
//!
//! This crate holds the parts of MTD discovery that do not touch the
//! operating system: the device model, the geometry sanity checks and the
//! `/proc/mtd` line format. It is `no_std` so the same types can be shared
//! by any backend that produces them.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` and derive serde traits for the
//!   device types
//!
//! # Example
//!
//! ```
//! use mtdscan_core::report::{check_preamble, parse_record};
//!
//! let report = b"dev:    size   erasesize  name\nmtd0: 00100000 00010000 \"boot\"\n";
//! let pos = check_preamble(report).unwrap();
//! let (record, next) = parse_record(report, pos).unwrap();
//! assert_eq!(record.mtd_num, 0);
//! assert_eq!(record.name.as_str(), "boot");
//! assert_eq!(next, report.len());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod error;
pub mod report;

pub use device::{
    DeviceDescriptor, DeviceName, DeviceSummary, DeviceType, MtdFlags, RawDeviceInfo,
    MTD_DEV_MAJOR, MTD_NAME_MAX,
};
pub use error::{Attribute, Error, Result};
pub use report::ReportRecord;
