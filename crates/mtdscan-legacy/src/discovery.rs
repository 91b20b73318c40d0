//! Device discovery on kernels without MTD sysfs
//!
//! [`LegacyMtd`] answers the questions the sysfs interface would normally
//! answer: which devices exist, how many there are, and what a given device
//! looks like.

use std::path::Path;

use log::debug;
use mtdscan_core::{DeviceDescriptor, DeviceSummary};

use crate::config::LegacyMtdConfig;
use crate::describe;
use crate::error::{LegacyMtdError, Result};
use crate::oob;
use crate::procfs::{self, ProcScan};

/// Legacy MTD discovery
///
/// Holds only paths; every query reads the status report and the device
/// nodes afresh.
///
/// # Example
///
/// ```ignore
/// use mtdscan_legacy::LegacyMtd;
///
/// let mtd = LegacyMtd::new();
/// let summary = mtd.summary()?;
/// if let Some(range) = summary.range() {
///     for num in range {
///         if mtd.dev_present(num)? {
///             let info = mtd.dev_info_by_num(num)?;
///             println!("mtd{}: {} ({})", num, info.name, info.device_type);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LegacyMtd {
    config: LegacyMtdConfig,
}

impl LegacyMtd {
    /// Discovery using `/proc/mtd` and `/dev/mtdN`
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovery using custom paths
    pub fn with_config(config: LegacyMtdConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &LegacyMtdConfig {
        &self.config
    }

    /// Check whether the status report can be read at all
    pub fn is_supported(&self) -> Result<bool> {
        procfs::procfs_is_supported(self.config.proc_path())
    }

    /// Check whether device `mtd_num` is listed in the status report
    pub fn dev_present(&self, mtd_num: u32) -> Result<bool> {
        let mut scan = self.scan()?;
        while let Some(record) = scan.advance()? {
            if record.mtd_num == mtd_num {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Count the devices and find the range of device numbers
    pub fn summary(&self) -> Result<DeviceSummary> {
        let mut scan = self.scan()?;
        let mut summary = DeviceSummary::new();
        while let Some(record) = scan.advance()? {
            summary.add(record.mtd_num);
        }

        debug!("Found {} MTD devices", summary.dev_count);
        Ok(summary)
    }

    /// Describe the device behind the node at `node`
    pub fn dev_info(&self, node: impl AsRef<Path>) -> Result<DeviceDescriptor> {
        describe::describe(node, self.config.proc_path())
    }

    /// Describe device `mtd_num`
    pub fn dev_info_by_num(&self, mtd_num: u32) -> Result<DeviceDescriptor> {
        self.dev_info(self.config.node_path(mtd_num))
    }

    /// Describe the device called `name`
    ///
    /// The report does not guarantee unique names, so the whole report is
    /// scanned and a name shared by several devices is an error.
    pub fn dev_info_by_name(&self, name: &str) -> Result<DeviceDescriptor> {
        let mut scan = self.scan()?;
        let mut found: Option<u32> = None;

        while let Some(record) = scan.advance()? {
            if record.name.as_str() != name {
                continue;
            }
            if found.is_some() {
                return Err(LegacyMtdError::DuplicateName(name.to_string()));
            }
            found = Some(record.mtd_num);
        }

        let mtd_num = found.ok_or_else(|| LegacyMtdError::NameNotFound(name.to_string()))?;
        debug!("MTD device \"{}\" is mtd{}", name, mtd_num);
        self.dev_info_by_num(mtd_num)
    }

    /// OOB bytes per page available on device `mtd_num`
    pub fn oob_avail(&self, mtd_num: u32) -> Result<u32> {
        oob::probe_oob(self.config.node_path(mtd_num))
    }

    fn scan(&self) -> Result<ProcScan> {
        ProcScan::open(self.config.proc_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::tests::proc_file;
    use tempfile::{NamedTempFile, TempDir};

    const REPORT: &str = "mtd0: 00100000 00010000 \"boot\"\n";

    fn discovery(report: &NamedTempFile, dev_dir: &TempDir) -> LegacyMtd {
        LegacyMtd::with_config(
            LegacyMtdConfig::new()
                .with_proc_path(report.path())
                .with_dev_dir(dev_dir.path()),
        )
    }

    #[test]
    fn test_dev_present() {
        let report = proc_file(
            "mtd2: 00100000 00010000 \"a\"\n\
             mtd0: 00100000 00010000 \"b\"\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let mtd = discovery(&report, &dir);
        assert!(mtd.dev_present(0).unwrap());
        assert!(mtd.dev_present(2).unwrap());
        assert!(!mtd.dev_present(1).unwrap());
    }

    #[test]
    fn test_dev_present_stops_at_match() {
        // The broken second line is never reached
        let report = proc_file(
            "mtd0: 00100000 00010000 \"boot\"\n\
             not an mtd line\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let mtd = discovery(&report, &dir);
        assert!(mtd.dev_present(0).unwrap());
        assert!(mtd.dev_present(1).is_err());
    }

    #[test]
    fn test_summary() {
        let report = proc_file(REPORT);
        let dir = tempfile::tempdir().unwrap();
        let summary = discovery(&report, &dir).summary().unwrap();
        assert_eq!(summary.dev_count, 1);
        assert_eq!(summary.lowest_mtd_num, 0);
        assert_eq!(summary.highest_mtd_num, 0);

        let report = proc_file(
            "mtd5: 00100000 00010000 \"a\"\n\
             mtd3: 00100000 00010000 \"b\"\n\
             mtd9: 00100000 00010000 \"c\"\n",
        );
        let summary = discovery(&report, &dir).summary().unwrap();
        assert_eq!(summary.dev_count, 3);
        assert_eq!(summary.range(), Some(3..=9));
    }

    #[test]
    fn test_summary_empty() {
        let report = proc_file("");
        let dir = tempfile::tempdir().unwrap();
        let summary = discovery(&report, &dir).summary().unwrap();
        assert_eq!(summary.dev_count, 0);
        assert_eq!(summary.lowest_mtd_num, u32::MAX);
        assert!(summary.range().is_none());
    }

    #[test]
    fn test_unsupported_kernel() {
        let dir = tempfile::tempdir().unwrap();
        let mtd = LegacyMtd::with_config(
            LegacyMtdConfig::new().with_proc_path(dir.path().join("mtd")),
        );
        assert!(!mtd.is_supported().unwrap());
        let err = mtd.summary().unwrap_err();
        assert!(err.is_unsupported_kernel());
    }

    #[test]
    fn test_dev_info_by_num_uses_dev_dir() {
        let report = proc_file(REPORT);
        let dir = tempfile::tempdir().unwrap();
        let err = discovery(&report, &dir).dev_info_by_num(0).unwrap_err();
        match err {
            LegacyMtdError::NodeNotFound { path } => assert_eq!(path, dir.path().join("mtd0")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_dev_info_by_name_not_found() {
        let report = proc_file(REPORT);
        let dir = tempfile::tempdir().unwrap();
        let err = discovery(&report, &dir).dev_info_by_name("rootfs").unwrap_err();
        assert!(matches!(err, LegacyMtdError::NameNotFound(ref n) if n == "rootfs"));
    }

    #[test]
    fn test_dev_info_by_name_duplicate() {
        let report = proc_file(
            "mtd0: 00100000 00010000 \"data\"\n\
             mtd1: 00100000 00010000 \"boot\"\n\
             mtd2: 00100000 00010000 \"data\"\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let err = discovery(&report, &dir).dev_info_by_name("data").unwrap_err();
        assert!(matches!(err, LegacyMtdError::DuplicateName(ref n) if n == "data"));
    }

    #[test]
    fn test_dev_info_by_name_delegates_to_number() {
        let report = proc_file(
            "mtd0: 00100000 00010000 \"boot\"\n\
             mtd4: 00100000 00010000 \"env\"\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let err = discovery(&report, &dir).dev_info_by_name("env").unwrap_err();
        match err {
            LegacyMtdError::NodeNotFound { path } => assert_eq!(path, dir.path().join("mtd4")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_dev_info_by_name_exact_match() {
        let report = proc_file("mtd0: 00100000 00010000 \"boot\"\n");
        let dir = tempfile::tempdir().unwrap();
        let mtd = discovery(&report, &dir);
        assert!(matches!(
            mtd.dev_info_by_name("boo"),
            Err(LegacyMtdError::NameNotFound(_))
        ));
        assert!(matches!(
            mtd.dev_info_by_name("boot0"),
            Err(LegacyMtdError::NameNotFound(_))
        ));
    }

    #[test]
    fn test_oob_avail_missing_node() {
        let report = proc_file(REPORT);
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discovery(&report, &dir).oob_avail(0),
            Err(LegacyMtdError::NodeNotFound { .. })
        ));
    }
}
