use serde::{Deserialize, Serialize};
use std::fmt;

/// Versioned address of a library: machine name plus major.minor.
///
/// Two installed libraries never share a `(machine_name, major, minor)`
/// tuple. The optional patch component rides along for patch-level
/// comparisons but takes no part in addressing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryVersionKey {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_version: Option<u32>,
}

impl LibraryVersionKey {
    /// Creates a key addressing `machine_name` at `major.minor`.
    pub fn new(machine_name: impl Into<String>, major_version: u32, minor_version: u32) -> Self {
        Self {
            machine_name: machine_name.into(),
            major_version,
            minor_version,
            patch_version: None,
        }
    }

    /// Attaches a patch version to the key.
    pub fn with_patch(mut self, patch_version: u32) -> Self {
        self.patch_version = Some(patch_version);
        self
    }

    /// On-disk folder name for this version, `Name-major.minor`.
    pub fn folder_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.machine_name, self.major_version, self.minor_version
        )
    }
}

impl fmt::Display for LibraryVersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}",
            self.machine_name, self.major_version, self.minor_version
        )
    }
}
