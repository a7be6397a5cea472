use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::RegistryError;
use crate::models::{
    DependencySet, DependencyType, Library, LibraryId, LibraryInput, LibraryVersionKey, csv_join,
};
use crate::platform::{AssetStore, PlatformHooks};

use super::settings::SettingsStore;
use super::{
    LIBRARY_COLUMNS, library_from_row, require_library_id, resolve_library_id, write_transaction,
};

/// Library records: version-aware lookup, saves, deletion, listings.
pub struct LibraryStore<'a> {
    conn: &'a Connection,
    assets: &'a dyn AssetStore,
    hooks: &'a dyn PlatformHooks,
}

/// A library joined with its dependency lists, the shape renderers and
/// editors consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDetails {
    pub library: Library,
    pub dependencies: DependencySet,
}

/// How a library is referenced by the rest of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryUsage {
    /// Distinct content instances with a usage row for the library.
    pub content_count: i64,
    /// Dependency edges from other libraries pointing at it.
    pub dependent_count: i64,
}

impl<'a> LibraryStore<'a> {
    pub(crate) fn new(
        conn: &'a Connection,
        assets: &'a dyn AssetStore,
        hooks: &'a dyn PlatformHooks,
    ) -> Self {
        Self {
            conn,
            assets,
            hooks,
        }
    }

    /// Looks up an installed library by version key.
    ///
    /// The key's patch component is ignored; `(machine_name, major,
    /// minor)` is the library's identity.
    pub fn find_by_key(
        &self,
        key: &LibraryVersionKey,
    ) -> Result<Option<Library>, RegistryError> {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries
             WHERE machine_name = ?1 AND major_version = ?2 AND minor_version = ?3"
        );
        let library = self
            .conn
            .query_row(
                &sql,
                params![key.machine_name, key.major_version, key.minor_version],
                library_from_row,
            )
            .optional()?;
        Ok(library)
    }

    /// Looks up a library by row ID.
    pub fn get(&self, id: LibraryId) -> Result<Library, RegistryError> {
        let sql = format!("SELECT {LIBRARY_COLUMNS} FROM libraries WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.get()], library_from_row)
            .optional()?
            .ok_or(RegistryError::LibraryIdNotFound(id))
    }

    /// Saves a library, inserting with `is_new` or updating the row
    /// addressed by the input's `(machine_name, major, minor)` tuple.
    ///
    /// The whole save is one transaction: the row write, the wholesale
    /// replacement of the library's translations, and on update the
    /// clearing of its outgoing dependency edges (a re-upload rebuilds
    /// the edge set afterwards). Saving the first runnable library also
    /// flips the `first_runnable_saved` setting.
    ///
    /// Inserting an already-present version fails with
    /// `DuplicateVersion`; updating an absent one with `LibraryNotFound`.
    pub fn save(&self, input: &LibraryInput, is_new: bool) -> Result<LibraryId, RegistryError> {
        let key = input.key();
        let tx = write_transaction(self.conn)?;

        let existing = resolve_library_id(&tx, &key)?;
        let id = match (is_new, existing) {
            (true, Some(_)) => return Err(RegistryError::DuplicateVersion(key)),
            (false, None) => return Err(RegistryError::LibraryNotFound(key)),
            (true, None) => {
                tx.execute(
                    "INSERT INTO libraries (
                        machine_name, title, major_version, minor_version, patch_version,
                        runnable, fullscreen, embed_types, preloaded_js, preloaded_css,
                        drop_library_css, semantics, has_icon
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        input.machine_name,
                        input.title,
                        input.major_version,
                        input.minor_version,
                        input.patch_version,
                        input.runnable,
                        input.fullscreen,
                        csv_join(&input.embed_types),
                        csv_join(&input.preloaded_js),
                        csv_join(&input.preloaded_css),
                        csv_join(&input.drop_library_css),
                        input.semantics,
                        input.has_icon,
                    ],
                )?;
                tx.last_insert_rowid()
            }
            (false, Some(id)) => {
                tx.execute(
                    "UPDATE libraries SET
                        title = ?1, patch_version = ?2, runnable = ?3, fullscreen = ?4,
                        embed_types = ?5, preloaded_js = ?6, preloaded_css = ?7,
                        drop_library_css = ?8, semantics = ?9, has_icon = ?10
                     WHERE id = ?11",
                    params![
                        input.title,
                        input.patch_version,
                        input.runnable,
                        input.fullscreen,
                        csv_join(&input.embed_types),
                        csv_join(&input.preloaded_js),
                        csv_join(&input.preloaded_css),
                        csv_join(&input.drop_library_css),
                        input.semantics,
                        input.has_icon,
                        id,
                    ],
                )?;
                // The upload pipeline rebuilds edges after the save, so
                // stale ones must not survive the update.
                tx.execute(
                    "DELETE FROM library_dependencies WHERE library_id = ?1",
                    params![id],
                )?;
                id
            }
        };

        tx.execute(
            "DELETE FROM library_translations WHERE library_id = ?1",
            params![id],
        )?;
        for (language_code, translation) in &input.translations {
            tx.execute(
                "INSERT INTO library_translations (library_id, language_code, translation)
                 VALUES (?1, ?2, ?3)",
                params![id, language_code, translation],
            )?;
        }

        if input.runnable {
            let settings = SettingsStore::new(self.conn);
            if !settings
                .get::<bool>(SettingsStore::FIRST_RUNNABLE_SAVED)?
                .unwrap_or(false)
            {
                settings.set(SettingsStore::FIRST_RUNNABLE_SAVED, &true)?;
            }
        }

        tx.commit().map_err(RegistryError::Transaction)?;

        if !is_new {
            self.hooks.cached_assets_removed(LibraryId::new(id));
        }

        Ok(LibraryId::new(id))
    }

    /// Deletes a library: its dependency edges in both directions, its
    /// translations, then the row itself, as one transaction.
    ///
    /// A library still referenced by content usage rows is not
    /// deletable; the attempt fails with `Constraint` and nothing
    /// changes. The on-disk folder is removed after the transaction
    /// commits, so an `Assets` error means the registry row is already
    /// gone.
    pub fn delete(&self, id: LibraryId) -> Result<(), RegistryError> {
        let library = self.get(id)?;
        let folder = library.folder_name();

        let tx = write_transaction(self.conn)?;
        tx.execute(
            "DELETE FROM library_dependencies
             WHERE library_id = ?1 OR required_library_id = ?1",
            params![id.get()],
        )?;
        tx.execute(
            "DELETE FROM library_translations WHERE library_id = ?1",
            params![id.get()],
        )?;
        tx.execute("DELETE FROM libraries WHERE id = ?1", params![id.get()])?;
        tx.commit().map_err(RegistryError::Transaction)?;

        self.assets
            .delete_library_folder(&folder)
            .map_err(RegistryError::Assets)?;
        self.hooks.cached_assets_removed(id);
        Ok(())
    }

    /// Lists every installed library, grouped by machine name.
    ///
    /// Groups appear in title order and each group's versions ascend by
    /// `(major, minor)`, the order installation pickers present.
    pub fn list_all(&self) -> Result<Vec<(String, Vec<Library>)>, RegistryError> {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries
             ORDER BY title, major_version, minor_version"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], library_from_row)?;

        let mut groups: Vec<(String, Vec<Library>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let library = row?;
            match index.get(&library.machine_name) {
                Some(&at) => groups[at].1.push(library),
                None => {
                    index.insert(library.machine_name.clone(), groups.len());
                    groups.push((library.machine_name.clone(), vec![library]));
                }
            }
        }
        Ok(groups)
    }

    /// Sets the tutorial URL on every version of the named library.
    pub fn set_tutorial_url(
        &self,
        machine_name: &str,
        tutorial_url: Option<&str>,
    ) -> Result<(), RegistryError> {
        let updated = self.conn.execute(
            "UPDATE libraries SET tutorial_url = ?2 WHERE machine_name = ?1",
            params![machine_name, tutorial_url],
        )?;
        if updated == 0 {
            return Err(RegistryError::MachineNameNotFound(machine_name.to_string()));
        }
        Ok(())
    }

    /// True when the key's version is a patch upgrade over an installed
    /// row with the same `(machine_name, major, minor)`.
    ///
    /// With the `dev_mode` setting on, every version counts as patched,
    /// so developers can re-install what they are working on.
    pub fn is_patched(&self, key: &LibraryVersionKey) -> Result<bool, RegistryError> {
        let dev_mode = SettingsStore::new(self.conn)
            .get::<bool>(SettingsStore::DEV_MODE)?
            .unwrap_or(false);
        if dev_mode {
            return Ok(true);
        }

        let Some(patch) = key.patch_version else {
            return Err(RegistryError::Constraint {
                message: "patch comparison needs a patch version on the key".to_string(),
            });
        };

        let patched = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM libraries
                WHERE machine_name = ?1 AND major_version = ?2 AND minor_version = ?3
                  AND patch_version < ?4)",
            params![key.machine_name, key.major_version, key.minor_version, patch],
            |row| row.get(0),
        )?;
        Ok(patched)
    }

    /// The raw semantics JSON of a version, `None` when the library is
    /// missing or ships no semantics.
    pub fn semantics(&self, key: &LibraryVersionKey) -> Result<Option<String>, RegistryError> {
        let semantics: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT semantics FROM libraries
                 WHERE machine_name = ?1 AND major_version = ?2 AND minor_version = ?3",
                params![key.machine_name, key.major_version, key.minor_version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(semantics.flatten())
    }

    /// Counts what still points at a library, the check run before
    /// offering deletion.
    pub fn usage(&self, id: LibraryId) -> Result<LibraryUsage, RegistryError> {
        self.get(id)?;

        let content_count = self.conn.query_row(
            "SELECT COUNT(DISTINCT content_id) FROM content_library_usage WHERE library_id = ?1",
            params![id.get()],
            |row| row.get(0),
        )?;
        let dependent_count = self.conn.query_row(
            "SELECT COUNT(*) FROM library_dependencies WHERE required_library_id = ?1",
            params![id.get()],
            |row| row.get(0),
        )?;

        Ok(LibraryUsage {
            content_count,
            dependent_count,
        })
    }

    /// Loads a library together with its dependencies grouped by type.
    pub fn load(&self, key: &LibraryVersionKey) -> Result<LibraryDetails, RegistryError> {
        let library = self
            .find_by_key(key)?
            .ok_or_else(|| RegistryError::LibraryNotFound(key.clone()))?;

        let mut stmt = self.conn.prepare(
            "SELECT required.machine_name, required.major_version, required.minor_version,
                    edge.dependency_type
             FROM library_dependencies edge
             JOIN libraries required ON required.id = edge.required_library_id
             WHERE edge.library_id = ?1
             ORDER BY edge.dependency_type, required.machine_name",
        )?;
        let rows = stmt.query_map(params![library.id.get()], |row| {
            let required = LibraryVersionKey::new(
                row.get::<_, String>(0)?,
                row.get(1)?,
                row.get(2)?,
            );
            Ok((row.get::<_, DependencyType>(3)?, required))
        })?;

        let mut dependencies = DependencySet::new();
        for row in rows {
            let (dependency_type, required) = row?;
            dependencies.push(dependency_type, required);
        }

        Ok(LibraryDetails {
            library,
            dependencies,
        })
    }

    /// Reads one stored language pack for a version.
    ///
    /// A missing library is an error; a missing language is `None`.
    pub fn translation(
        &self,
        key: &LibraryVersionKey,
        language_code: &str,
    ) -> Result<Option<String>, RegistryError> {
        let id = require_library_id(self.conn, key)?;
        let translation = self
            .conn
            .query_row(
                "SELECT translation FROM library_translations
                 WHERE library_id = ?1 AND language_code = ?2",
                params![id, language_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(translation)
    }

    /// Language codes a version ships translations for, sorted.
    pub fn language_codes(&self, key: &LibraryVersionKey) -> Result<Vec<String>, RegistryError> {
        let id = require_library_id(self.conn, key)?;
        let mut stmt = self.conn.prepare(
            "SELECT language_code FROM library_translations
             WHERE library_id = ?1 ORDER BY language_code",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }
}
