//! Error types for legacy MTD discovery

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Legacy MTD discovery errors
#[derive(Debug, Error)]
pub enum LegacyMtdError {
    /// The status report cannot be opened or read
    #[error("cannot read \"{}\": {source}", path.display())]
    ProcUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The status report does not have the expected format
    #[error("malformed \"{}\": {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: mtdscan_core::Error,
    },

    /// Device node does not exist
    #[error(
        "cannot open \"{}\": no such file; the MTD subsystem is old and does not \
         support sysfs, so MTD character device nodes have to exist",
        path.display()
    )]
    NodeNotFound { path: PathBuf },

    /// Device node exists but cannot be opened
    #[error("cannot open \"{}\": {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// fstat on an open node failed
    #[error("cannot stat \"{}\": {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Node is not a character device
    #[error("\"{}\" is not a character device", path.display())]
    NotCharDevice { path: PathBuf },

    /// Node is a character device of some other driver
    #[error(
        "\"{}\" has major number {major}, MTD devices have major {expected}",
        path.display()
    )]
    WrongMajor {
        path: PathBuf,
        major: u32,
        expected: u32,
    },

    /// A device-control request failed
    #[error("{request} ioctl request on \"{}\" failed: {source}", path.display())]
    Ioctl {
        request: &'static str,
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },

    /// The kernel reported attributes that break the geometry invariants
    #[error("mtd{mtd_num} (\"{}\") has {source}", path.display())]
    InsaneAttributes {
        mtd_num: u32,
        path: PathBuf,
        #[source]
        source: mtdscan_core::Error,
    },

    /// The device is not listed in the status report
    #[error("mtd{mtd_num} not found in \"{}\"", path.display())]
    NameUnresolved { mtd_num: u32, path: PathBuf },

    /// No device has the requested name
    #[error("no MTD device named \"{0}\"")]
    NameNotFound(String),

    /// More than one device has the requested name
    #[error("multiple MTD devices found matching name \"{0}\"")]
    DuplicateName(String),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
}

impl LegacyMtdError {
    /// Returns true if the failure means `/proc/mtd` is not usable at all
    ///
    /// Callers use this to fall back to the sysfs interface instead of
    /// reporting an error.
    pub fn is_unsupported_kernel(&self) -> bool {
        match self {
            Self::ProcUnavailable { .. } => true,
            Self::Malformed { source, .. } => *source == mtdscan_core::Error::BadPreamble,
            _ => false,
        }
    }
}

/// Result type for legacy MTD discovery
pub type Result<T> = std::result::Result<T, LegacyMtdError>;
