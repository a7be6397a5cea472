use serde::{Deserialize, Serialize};

use super::{ContentId, DependencyType, LibraryId, LibraryVersionKey};

/// One library a piece of content uses, as supplied to a usage save.
///
/// The CSS-drop flag is not part of the input: it is derived from the
/// whole batch when the rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub library_id: LibraryId,
    pub dependency_type: DependencyType,
    /// Load-order position, ascending.
    pub weight: u32,
}

impl UsageEntry {
    pub fn new(library_id: LibraryId, dependency_type: DependencyType, weight: u32) -> Self {
        Self {
            library_id,
            dependency_type,
            weight,
        }
    }
}

/// A stored usage row joined with the library it points at.
///
/// This is the shape asset assembly consumes: enough library data to
/// build script and style lists without further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDependency {
    pub content_id: ContentId,
    pub library_id: LibraryId,
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    pub preloaded_js: Vec<String>,
    pub preloaded_css: Vec<String>,
    /// True when another library in the same content drops this one's CSS.
    pub drop_css: bool,
    pub dependency_type: DependencyType,
    pub weight: u32,
}

impl ContentDependency {
    /// The versioned address of the used library.
    pub fn key(&self) -> LibraryVersionKey {
        LibraryVersionKey::new(
            self.machine_name.clone(),
            self.major_version,
            self.minor_version,
        )
        .with_patch(self.patch_version)
    }

    /// Folder name of the used library, `Name-major.minor`.
    pub fn folder_name(&self) -> String {
        self.key().folder_name()
    }
}
