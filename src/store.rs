mod catalog;
mod dependency;
mod library;
mod settings;
mod usage;

pub use catalog::CatalogCacheStore;
pub use dependency::DependencyGraphStore;
pub use library::{LibraryDetails, LibraryStore, LibraryUsage};
pub use settings::SettingsStore;
pub use usage::ContentUsageStore;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};

use crate::db::Database;
use crate::error::RegistryError;
use crate::lock::DependencyLocks;
use crate::models::{Library, LibraryId, LibraryVersionKey, csv_split};
use crate::platform::{AssetStore, NoopAssets, NoopHooks, PlatformHooks};

/// Facade over the registry stores.
///
/// Owns the database connection, the per-library dependency locks and the
/// platform collaborators, and hands out store views scoped to itself.
/// This type is UI-independent; the CLI and any embedding platform go
/// through the same store methods.
///
/// # Examples
///
/// ```
/// use lectern::Registry;
///
/// # fn main() -> anyhow::Result<()> {
/// let registry = Registry::builder().in_memory().build()?;
/// assert!(registry.libraries().list_all()?.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct Registry {
    db: Database,
    locks: DependencyLocks,
    assets: Arc<dyn AssetStore>,
    hooks: Arc<dyn PlatformHooks>,
}

impl Registry {
    /// Creates a registry over the given database with no-op collaborators.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: DependencyLocks::new(),
            assets: Arc::new(NoopAssets),
            hooks: Arc::new(NoopHooks),
        }
    }

    /// Starts building a registry with explicit configuration.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct database
    /// access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Library records: lookup, save, delete, listing.
    pub fn libraries(&self) -> LibraryStore<'_> {
        LibraryStore::new(
            self.db.connection(),
            self.assets.as_ref(),
            self.hooks.as_ref(),
        )
    }

    /// Typed dependency edges between libraries.
    pub fn dependencies(&self) -> DependencyGraphStore<'_> {
        DependencyGraphStore::new(self.db.connection(), &self.locks)
    }

    /// Content-to-library usage rows.
    pub fn usage(&self) -> ContentUsageStore<'_> {
        ContentUsageStore::new(self.db.connection())
    }

    /// The mirrored hub catalog.
    pub fn catalog(&self) -> CatalogCacheStore<'_> {
        CatalogCacheStore::new(self.db.connection())
    }

    /// Registry options.
    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(self.db.connection())
    }
}

/// Builder for constructing `Registry` instances.
///
/// Defaults to an in-memory database, fresh dependency locks and no-op
/// collaborators. Handles opened over the same database file should share
/// one `DependencyLocks` via [`RegistryBuilder::locks`].
///
/// # Examples
///
/// ```
/// use lectern::Registry;
///
/// # fn main() -> anyhow::Result<()> {
/// let registry = Registry::builder().in_memory().build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    path: Option<PathBuf>,
    locks: Option<DependencyLocks>,
    assets: Option<Arc<dyn AssetStore>>,
    hooks: Option<Arc<dyn PlatformHooks>>,
}

impl RegistryBuilder {
    /// Creates a new `RegistryBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a file-backed database at the given path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Uses an in-memory database (the default).
    pub fn in_memory(mut self) -> Self {
        self.path = None;
        self
    }

    /// Shares an existing lock table with this registry.
    pub fn locks(mut self, locks: DependencyLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Sets the asset store notified when library folders become stale.
    pub fn assets(mut self, assets: impl AssetStore + 'static) -> Self {
        self.assets = Some(Arc::new(assets));
        self
    }

    /// Sets the platform hook receiver.
    pub fn hooks(mut self, hooks: impl PlatformHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Opens the database and builds the `Registry`.
    pub fn build(self) -> Result<Registry> {
        let db = match &self.path {
            Some(path) => Database::open(path)?,
            None => Database::in_memory()?,
        };

        Ok(Registry {
            db,
            locks: self.locks.unwrap_or_default(),
            assets: self.assets.unwrap_or_else(|| Arc::new(NoopAssets)),
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopHooks)),
        })
    }
}

/// Column list matching [`library_from_row`].
pub(crate) const LIBRARY_COLUMNS: &str = "id, machine_name, title, major_version, minor_version, \
     patch_version, runnable, fullscreen, embed_types, preloaded_js, preloaded_css, \
     drop_library_css, semantics, has_icon, tutorial_url";

/// Maps a full library row selected with [`LIBRARY_COLUMNS`].
pub(crate) fn library_from_row(row: &Row<'_>) -> rusqlite::Result<Library> {
    Ok(Library {
        id: LibraryId::new(row.get(0)?),
        machine_name: row.get(1)?,
        title: row.get(2)?,
        major_version: row.get(3)?,
        minor_version: row.get(4)?,
        patch_version: row.get(5)?,
        runnable: row.get(6)?,
        fullscreen: row.get(7)?,
        embed_types: csv_split(&row.get::<_, String>(8)?),
        preloaded_js: csv_split(&row.get::<_, String>(9)?),
        preloaded_css: csv_split(&row.get::<_, String>(10)?),
        drop_library_css: csv_split(&row.get::<_, String>(11)?),
        semantics: row.get(12)?,
        has_icon: row.get(13)?,
        tutorial_url: row.get(14)?,
    })
}

/// Resolves a version key to its library row ID.
///
/// Addressing ignores the key's patch component.
pub(crate) fn resolve_library_id(
    conn: &Connection,
    key: &LibraryVersionKey,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM libraries
         WHERE machine_name = ?1 AND major_version = ?2 AND minor_version = ?3",
        params![key.machine_name, key.major_version, key.minor_version],
        |row| row.get(0),
    )
    .optional()
}

/// Like [`resolve_library_id`], but a missing library is an error.
pub(crate) fn require_library_id(
    conn: &Connection,
    key: &LibraryVersionKey,
) -> Result<i64, RegistryError> {
    resolve_library_id(conn, key)?.ok_or_else(|| RegistryError::LibraryNotFound(key.clone()))
}

/// Opens a write transaction that takes the database write lock up front.
///
/// The replace-style writes all read before their first write. A deferred
/// transaction upgrading to the write lock after another connection has
/// committed fails with SQLITE_BUSY without consulting the busy handler,
/// so writers over a shared file must start immediate to stay on the
/// busy-timeout path.
pub(crate) fn write_transaction(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}
