//! Configuration for legacy MTD discovery

use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{LegacyMtdError, Result};

/// Default location of the MTD status report
pub const MTD_PROC_FILE: &str = "/proc/mtd";

/// Default directory holding the `mtdN` character nodes
pub const MTD_DEV_DIR: &str = "/dev";

/// Where to find the status report and the device nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMtdConfig {
    /// Path of the status report (`/proc/mtd`)
    pub proc_path: PathBuf,
    /// Directory containing `mtdN` nodes (`/dev`)
    pub dev_dir: PathBuf,
}

impl Default for LegacyMtdConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from(MTD_PROC_FILE),
            dev_dir: PathBuf::from(MTD_DEV_DIR),
        }
    }
}

impl LegacyMtdConfig {
    /// Create a configuration with the standard system paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the status report from another path
    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    /// Look for device nodes in another directory
    pub fn with_dev_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dev_dir = dir.into();
        self
    }

    /// Path of the character node for device `mtd_num`
    pub fn node_path(&self, mtd_num: u32) -> PathBuf {
        self.dev_dir.join(format!("mtd{}", mtd_num))
    }

    /// Path of the status report
    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }
}

/// Parse options from key-value pairs
///
/// # Supported options
/// - `proc=PATH` - status report path (default `/proc/mtd`)
/// - `devdir=DIR` - device node directory (default `/dev`)
///
/// # Example
/// ```ignore
/// let config = parse_options(&[("devdir", "/tmp/dev")])?;
/// ```
pub fn parse_options(options: &[(&str, &str)]) -> Result<LegacyMtdConfig> {
    let mut config = LegacyMtdConfig::default();

    for (key, value) in options {
        match *key {
            "proc" => config.proc_path = non_empty("proc", value)?.into(),
            "devdir" => config.dev_dir = non_empty("devdir", value)?.into(),
            _ => {
                warn!("Unknown legacy MTD option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn non_empty<'a>(name: &'static str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(LegacyMtdError::InvalidParameter {
            name,
            message: "path must not be empty".to_string(),
        });
    }
    Ok(value)
}
