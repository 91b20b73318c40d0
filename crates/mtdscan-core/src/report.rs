//! `/proc/mtd` report format
//!
//! On kernels without MTD sysfs support, `/proc/mtd` is the only place that
//! lists the devices and their names:
//!
//! ```text
//! dev:    size   erasesize  name
//! mtd0: 00040000 00020000 "u-boot"
//! mtd1: 07fc0000 00020000 "rootfs"
//! ```
//!
//! This module parses one line at a time from a byte buffer. Keeping the
//! buffer and the position is up to the caller.

use crate::device::{DeviceName, MTD_NAME_MAX};
use crate::error::{Error, Result};

/// First line of `/proc/mtd`
pub const PROC_MTD_FIRST: &str = "dev:    size   erasesize  name\n";

/// Maximum number of bytes read from `/proc/mtd`
pub const PROC_MTD_MAX_LEN: usize = 4096;

/// One device line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    /// Device number
    pub mtd_num: u32,
    /// Total size in bytes
    pub size: u64,
    /// Eraseblock size in bytes
    pub eb_size: u32,
    /// Device name
    pub name: DeviceName,
}

/// Check the report header and return the offset of the first device line
pub fn check_preamble(buf: &[u8]) -> Result<usize> {
    let first = PROC_MTD_FIRST.as_bytes();
    if buf.len() < first.len() || !buf.starts_with(first) {
        return Err(Error::BadPreamble);
    }
    Ok(first.len())
}

/// Parse the device line starting at `pos`
///
/// Returns the record and the offset of the next line. The line must look
/// like `mtd<N>: <hex size> <hex erasesize> "<name>"` followed by a newline.
pub fn parse_record(buf: &[u8], pos: usize) -> Result<(ReportRecord, usize)> {
    let rest = buf.get(pos..).ok_or(Error::PatternNotFound)?;
    let (mtd_num, size, eb_size) = scan_line(rest).ok_or(Error::PatternNotFound)?;

    // The name is the only quoted field, so the first quote opens it
    let open = find_quote(buf, pos).ok_or(Error::OpeningQuoteNotFound)?;
    let start = open + 1;
    if start >= buf.len() {
        return Err(Error::OpeningQuoteNotFound);
    }
    let close = find_quote(buf, start).ok_or(Error::ClosingQuoteNotFound)?;

    let raw_name = &buf[start..close];
    if raw_name.len() > MTD_NAME_MAX {
        return Err(Error::NameTooLong {
            mtd_num,
            len: raw_name.len(),
        });
    }
    let name_str = core::str::from_utf8(raw_name).map_err(|_| Error::NameNotUtf8 { mtd_num })?;
    let mut name = DeviceName::new();
    name.push_str(name_str).map_err(|_| Error::NameTooLong {
        mtd_num,
        len: raw_name.len(),
    })?;

    if buf.get(close + 1) != Some(&b'\n') {
        return Err(Error::MissingNewline { mtd_num });
    }

    Ok((
        ReportRecord {
            mtd_num,
            size,
            eb_size,
            name,
        },
        close + 2,
    ))
}

fn find_quote(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .iter()
        .position(|&b| b == b'"')
        .map(|off| from + off)
}

/// Match `mtd%d: %llx %x` the way sscanf does
fn scan_line(line: &[u8]) -> Option<(u32, u64, u32)> {
    let mut sc = Scanner { buf: line, pos: 0 };
    sc.literal(b"mtd")?;
    let mtd_num = u32::try_from(sc.number(10)?).ok()?;
    sc.literal(b":")?;
    let size = sc.number(16)?;
    let eb_size = u32::try_from(sc.number(16)?).ok()?;
    Some((mtd_num, size, eb_size))
}

struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn literal(&mut self, lit: &[u8]) -> Option<()> {
        if self.buf.get(self.pos..)?.starts_with(lit) {
            self.pos += lit.len();
            Some(())
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Unsigned integer with leading whitespace; base 16 takes an optional `0x`
    fn number(&mut self, radix: u32) -> Option<u64> {
        self.skip_whitespace();

        if radix == 16 {
            let rest = &self.buf[self.pos..];
            if rest.len() > 2
                && rest[0] == b'0'
                && (rest[1] | 0x20) == b'x'
                && rest[2].is_ascii_hexdigit()
            {
                self.pos += 2;
            }
        }

        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(digit) = self.peek().and_then(|b| (b as char).to_digit(radix)) {
            value = value
                .checked_mul(u64::from(radix))?
                .checked_add(u64::from(digit))?;
            self.pos += 1;
        }

        (self.pos > start).then_some(value)
    }
}
