//! Seams between the registry and the platform embedding it.
//!
//! The registry stores rows; everything else a platform layers on top,
//! deleting asset folders, gating actions, reacting to cache changes,
//! comes through the traits here. Shipped implementations cover the
//! common cases so a bare registry works out of the box.

use std::io;
use std::path::PathBuf;

use crate::models::{ContentId, LibraryId};

/// Removal of on-disk library folders.
///
/// Called by the registry after a library row is deleted, with the
/// folder name `Name-major.minor`. Implementations must treat an
/// already-missing folder as success.
pub trait AssetStore: Send + Sync {
    fn delete_library_folder(&self, folder_name: &str) -> io::Result<()>;
}

/// Asset store removing library folders beneath a base directory.
pub struct DirAssetStore {
    base: PathBuf,
}

impl DirAssetStore {
    /// Creates an asset store rooted at the directory holding the
    /// per-library folders.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetStore for DirAssetStore {
    fn delete_library_folder(&self, folder_name: &str) -> io::Result<()> {
        // Folder names come from machine names; anything resembling a
        // path must not escape the base directory.
        if folder_name.is_empty()
            || folder_name == "."
            || folder_name == ".."
            || folder_name.contains(['/', '\\'])
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to remove library folder named {folder_name:?}"),
            ));
        }

        match std::fs::remove_dir_all(self.base.join(folder_name)) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Asset store for registries that manage no files at all.
pub struct NoopAssets;

impl AssetStore for NoopAssets {
    fn delete_library_folder(&self, _folder_name: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Actions a platform may want to gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    DownloadContent,
    EmbedContent,
    CreateRestricted,
    UpdateLibraries,
    InstallRecommended,
}

impl Permission {
    /// Every permission.
    pub const ALL: [Permission; 5] = [
        Self::DownloadContent,
        Self::EmbedContent,
        Self::CreateRestricted,
        Self::UpdateLibraries,
        Self::InstallRecommended,
    ];
}

/// Authorization answers supplied by the embedding platform.
///
/// The registry never consults this itself; callers gate their own use
/// of the mutating operations with it.
pub trait PermissionPolicy: Send + Sync {
    fn is_granted(&self, permission: Permission, content_id: Option<ContentId>) -> bool;
}

/// Grants every permission. Suitable for trusted single-user setups.
pub struct AllowAll;

impl PermissionPolicy for AllowAll {
    fn is_granted(&self, _permission: Permission, _content_id: Option<ContentId>) -> bool {
        true
    }
}

/// Denies every permission.
pub struct DenyAll;

impl PermissionPolicy for DenyAll {
    fn is_granted(&self, _permission: Permission, _content_id: Option<ContentId>) -> bool {
        false
    }
}

/// Notifications the registry raises for the embedding platform.
///
/// Every method defaults to doing nothing, so implementations override
/// only what they react to.
pub trait PlatformHooks: Send + Sync {
    /// Aggregated assets were written for a library.
    fn cached_assets_saved(&self, library_id: LibraryId) {
        let _ = library_id;
    }

    /// A library changed or was deleted, so aggregated assets built
    /// from it are stale.
    fn cached_assets_removed(&self, library_id: LibraryId) {
        let _ = library_id;
    }

    /// An export bundle was produced for a content instance.
    fn export_created(&self, content_id: ContentId) {
        let _ = content_id;
    }
}

/// Hook receiver that ignores every notification.
pub struct NoopHooks;

impl PlatformHooks for NoopHooks {}
