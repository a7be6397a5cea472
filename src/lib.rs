pub mod db;
pub mod error;
pub mod hub;
pub mod lock;
pub mod models;
pub mod platform;
pub mod store;

pub use db::Database;
pub use error::RegistryError;
pub use lock::DependencyLocks;
pub use models::{
    CatalogEntry, ContentDependency, ContentId, DependencySet, DependencyType, Library, LibraryId,
    LibraryInput, LibraryInputBuilder, LibraryVersionKey, UsageEntry,
};
pub use platform::{
    AllowAll, AssetStore, DenyAll, DirAssetStore, NoopAssets, NoopHooks, Permission,
    PermissionPolicy, PlatformHooks,
};
pub use store::{
    CatalogCacheStore, ContentUsageStore, DependencyGraphStore, LibraryDetails, LibraryStore,
    LibraryUsage, Registry, RegistryBuilder, SettingsStore,
};
