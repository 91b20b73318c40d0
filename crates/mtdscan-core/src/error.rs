//! Error types for mtdscan-core
//!
//! These errors carry no allocations so they can be returned from `no_std`
//! code. Backends wrap them with the path and device context they know about.

use core::fmt;

/// Device attribute named by an [`Error::InsaneAttribute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Minimum I/O unit size (`writesize`)
    MinIoUnitSize,
    /// Eraseblock size (`erasesize`)
    EraseBlockSize,
    /// Total device size
    TotalSize,
    /// Raw MTD type code
    DeviceType,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinIoUnitSize => write!(f, "min. I/O unit size"),
            Self::EraseBlockSize => write!(f, "eraseblock size"),
            Self::TotalSize => write!(f, "size"),
            Self::DeviceType => write!(f, "device type"),
        }
    }
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Report format errors
    /// Report is shorter than the header line or starts with something else
    BadPreamble,
    /// Line does not match `mtd%d: %llx %x`
    PatternNotFound,
    /// No opening quote of the name field before end of data
    OpeningQuoteNotFound,
    /// No closing quote of the name field before end of data
    ClosingQuoteNotFound,
    /// Quoted name is longer than [`crate::MTD_NAME_MAX`]
    NameTooLong {
        /// Device number of the offending line
        mtd_num: u32,
        /// Length of the quoted name in bytes
        len: usize,
    },
    /// Quoted name is not valid UTF-8
    NameNotUtf8 {
        /// Device number of the offending line
        mtd_num: u32,
    },
    /// Closing quote is not followed by a newline
    MissingNewline {
        /// Device number of the offending line
        mtd_num: u32,
    },

    // Attribute errors
    /// Device number does not belong to the MTD character driver
    WrongMajor {
        /// Major number of the device
        major: u32,
    },
    /// The kernel reported a value that breaks the device geometry invariants
    InsaneAttribute {
        /// The first attribute found to be invalid
        field: Attribute,
        /// The value the kernel reported for it
        value: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPreamble => write!(
                f,
                "report does not start with \"{}\"",
                crate::report::PROC_MTD_FIRST.trim_end()
            ),
            Self::PatternNotFound => write!(f, "\"mtd%d: %llx %x\" pattern not found"),
            Self::OpeningQuoteNotFound => write!(f, "opening \" not found"),
            Self::ClosingQuoteNotFound => write!(f, "closing \" not found"),
            Self::NameTooLong { mtd_num, len } => write!(
                f,
                "too long mtd{} device name ({} bytes, max {})",
                mtd_num,
                len,
                crate::MTD_NAME_MAX
            ),
            Self::NameNotUtf8 { mtd_num } => {
                write!(f, "mtd{} device name is not valid UTF-8", mtd_num)
            }
            Self::MissingNewline { mtd_num } => {
                write!(f, "newline after mtd{} device name not found", mtd_num)
            }
            Self::WrongMajor { major } => write!(
                f,
                "major number {} is not the MTD major {}",
                major,
                crate::MTD_DEV_MAJOR
            ),
            Self::InsaneAttribute { field, value } => {
                write!(f, "insane {} {}", field, value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
