//! manifest::vendor
//!
//! govendor's `vendor/vendor.json`.
//!
//! Only the package list matters for pinning. Other top-level keys
//! (`comment`, `ignore`, `rootPath`, ...) are accepted and dropped.

use std::path::Path;

use serde::Deserialize;

use super::ManifestError;
use crate::core::lock::PackageLock;

/// Location of the lock file inside a project.
pub const VENDOR_JSON: &str = "vendor/vendor.json";

/// A decoded `vendor.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VendorFile {
    /// Package locks in file order
    #[serde(default, alias = "Package")]
    pub package: Vec<PackageLock>,
}

impl VendorFile {
    /// Decode `vendor.json` text; `file` names the source in errors.
    pub fn parse(text: &str, file: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(text).map_err(|source| ManifestError::Json {
            file: file.to_string(),
            source,
        })
    }

    /// Read the lock file of the project exported at `project_dir`.
    pub fn read(project_dir: &Path) -> Result<Self, ManifestError> {
        let path = project_dir.join(VENDOR_JSON);
        let display = path.display().to_string();
        let text = std::fs::read_to_string(&path).map_err(|e| ManifestError::Parse {
            file: display.clone(),
            line: 0,
            message: e.to_string(),
        })?;
        Self::parse(&text, &display)
    }
}
