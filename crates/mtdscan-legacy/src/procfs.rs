//! `/proc/mtd` scanning
//!
//! A [`ProcScan`] reads the status report once and hands out one device
//! record per [`ProcScan::advance`] call. It is forward-only: to look at the
//! report again, open a new scan.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::debug;
use mtdscan_core::report::{check_preamble, parse_record, PROC_MTD_MAX_LEN};
use mtdscan_core::ReportRecord;
use nix::errno::Errno;
use nix::unistd::{access, AccessFlags};

use crate::error::{LegacyMtdError, Result};

/// Cursor over the device lines of a status report
#[derive(Debug)]
pub struct ProcScan {
    /// Where the report was read from, for error messages
    path: PathBuf,
    /// Report contents, `None` once the scan has finished
    buf: Option<Vec<u8>>,
    /// Offset of the next unparsed line
    next: usize,
}

impl ProcScan {
    /// Read the report at `path` and position the cursor on the first device line
    ///
    /// # Errors
    /// - [`LegacyMtdError::ProcUnavailable`] if the file cannot be opened or read
    /// - [`LegacyMtdError::Malformed`] if the header line is missing or wrong
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |source: io::Error| LegacyMtdError::ProcUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unavailable)?;
        let mut buf = Vec::with_capacity(PROC_MTD_MAX_LEN);
        file.take(PROC_MTD_MAX_LEN as u64)
            .read_to_end(&mut buf)
            .map_err(unavailable)?;

        let next = check_preamble(&buf).map_err(|source| LegacyMtdError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Read {} bytes from {}", buf.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            buf: Some(buf),
            next,
        })
    }

    /// Parse the next device line
    ///
    /// Returns `Ok(None)` at the end of the report. The buffer is dropped at
    /// the end of the report and on the first parse error; from then on every
    /// call returns `Ok(None)`.
    pub fn advance(&mut self) -> Result<Option<ReportRecord>> {
        let Some(buf) = self.buf.as_deref() else {
            return Ok(None);
        };

        if self.next >= buf.len() {
            self.release();
            return Ok(None);
        }

        match parse_record(buf, self.next) {
            Ok((record, next)) => {
                self.next = next;
                Ok(Some(record))
            }
            Err(source) => {
                let offset = self.next;
                self.release();
                debug!("Parse error at offset {} of {}", offset, self.path.display());
                Err(LegacyMtdError::Malformed {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Path the report was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset of the next unparsed byte
    pub fn position(&self) -> usize {
        self.next
    }

    /// Returns true once the scan has ended and the buffer is gone
    pub fn is_finished(&self) -> bool {
        self.buf.is_none()
    }

    fn release(&mut self) {
        self.buf = None;
    }
}

/// Check whether the status report exists and is readable
///
/// A missing file is a normal answer on kernels built without procfs MTD
/// support and yields `Ok(false)`. Any other access failure is an error.
pub fn procfs_is_supported(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match access(path, AccessFlags::R_OK) {
        Ok(()) => Ok(true),
        Err(Errno::ENOENT) => Ok(false),
        Err(errno) => Err(LegacyMtdError::ProcUnavailable {
            path: path.to_path_buf(),
            source: errno.into(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mtdscan_core::report::PROC_MTD_FIRST;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write a status report with the standard header followed by `lines`
    pub(crate) fn proc_file(lines: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PROC_MTD_FIRST.as_bytes()).unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_scan_all_records() {
        let file = proc_file(
            "mtd0: 00100000 00010000 \"boot\"\n\
             mtd2: 00200000 00010000 \"kernel\"\n\
             mtd1: 01000000 00020000 \"rootfs\"\n",
        );
        let mut scan = ProcScan::open(file.path()).unwrap();
        assert_eq!(scan.position(), PROC_MTD_FIRST.len());

        let mut seen = Vec::new();
        while let Some(record) = scan.advance().unwrap() {
            seen.push((record.mtd_num, record.name.to_string()));
        }
        assert_eq!(
            seen,
            vec![
                (0, "boot".to_string()),
                (2, "kernel".to_string()),
                (1, "rootfs".to_string()),
            ]
        );
        assert!(scan.is_finished());
        assert!(scan.advance().unwrap().is_none());
    }

    #[test]
    fn test_empty_report() {
        let file = proc_file("");
        let mut scan = ProcScan::open(file.path()).unwrap();
        assert!(!scan.is_finished());
        assert!(scan.advance().unwrap().is_none());
        assert!(scan.is_finished());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcScan::open(dir.path().join("mtd")).unwrap_err();
        assert!(matches!(err, LegacyMtdError::ProcUnavailable { .. }));
        assert!(err.is_unsupported_kernel());
    }

    #[test]
    fn test_bad_preamble() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"dev:  size\n").unwrap();
        let err = ProcScan::open(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LegacyMtdError::Malformed {
                source: mtdscan_core::Error::BadPreamble,
                ..
            }
        ));
        assert!(err.is_unsupported_kernel());
    }

    #[test]
    fn test_error_ends_scan() {
        let file = proc_file(
            "mtd0: 00100000 00010000 \"boot\"\n\
             garbage\n\
             mtd1: 00100000 00010000 \"data\"\n",
        );
        let mut scan = ProcScan::open(file.path()).unwrap();
        assert_eq!(scan.advance().unwrap().unwrap().mtd_num, 0);

        let err = scan.advance().unwrap_err();
        assert!(matches!(
            err,
            LegacyMtdError::Malformed {
                source: mtdscan_core::Error::PatternNotFound,
                ..
            }
        ));
        assert!(!err.is_unsupported_kernel());
        assert!(scan.is_finished());
        assert!(scan.advance().unwrap().is_none());
    }

    #[test]
    fn test_report_truncated_at_max_len() {
        // Lines past PROC_MTD_MAX_LEN are cut off mid-line and fail to parse
        let line = "mtd0: 00100000 00010000 \"boot\"\n";
        let file = proc_file(&line.repeat(PROC_MTD_MAX_LEN / line.len() + 1));
        let mut scan = ProcScan::open(file.path()).unwrap();
        let result = loop {
            match scan.advance() {
                Ok(Some(_)) => continue,
                other => break other,
            }
        };
        assert!(result.is_err());
    }

    #[test]
    fn test_procfs_is_supported() {
        let file = proc_file("");
        assert!(procfs_is_supported(file.path()).unwrap());

        let dir = tempfile::tempdir().unwrap();
        assert!(!procfs_is_supported(dir.path().join("missing")).unwrap());
    }
}
