use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::RegistryError;
use crate::models::{ContentDependency, ContentId, DependencyType, LibraryId, UsageEntry, csv_split};

use super::write_transaction;

/// Which libraries each content instance uses, with load order and
/// CSS-drop flags.
pub struct ContentUsageStore<'a> {
    conn: &'a Connection,
}

impl<'a> ContentUsageStore<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Replaces a content instance's usage rows with the given entries.
    ///
    /// The CSS-drop flag is derived from the whole batch before
    /// anything is written: the `drop_library_css` lists of every used
    /// library are unioned, and a row's flag is set when its library's
    /// machine name appears in that union. The result is the same for
    /// any ordering of the entries. The rewrite is one transaction; an
    /// entry naming an unknown library rejects the batch.
    pub fn replace_usage(
        &self,
        content_id: ContentId,
        entries: &[UsageEntry],
    ) -> Result<(), RegistryError> {
        let tx = write_transaction(self.conn)?;

        let mut dropped: HashSet<String> = HashSet::new();
        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            let (machine_name, drop_list): (String, String) = tx
                .query_row(
                    "SELECT machine_name, drop_library_css FROM libraries WHERE id = ?1",
                    params![entry.library_id.get()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or(RegistryError::LibraryIdNotFound(entry.library_id))?;
            dropped.extend(csv_split(&drop_list));
            resolved.push((entry, machine_name));
        }

        tx.execute(
            "DELETE FROM content_library_usage WHERE content_id = ?1",
            params![content_id.get()],
        )?;
        for (entry, machine_name) in resolved {
            tx.execute(
                "INSERT INTO content_library_usage
                    (content_id, library_id, dependency_type, weight, drop_css)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    content_id.get(),
                    entry.library_id.get(),
                    entry.dependency_type,
                    entry.weight,
                    dropped.contains(&machine_name),
                ],
            )?;
        }

        tx.commit().map_err(RegistryError::Transaction)
    }

    /// Loads a content instance's usage rows joined with their library
    /// data, ascending by weight.
    pub fn load_usage(
        &self,
        content_id: ContentId,
        dependency_type: Option<DependencyType>,
    ) -> Result<Vec<ContentDependency>, RegistryError> {
        let base = "SELECT usage.content_id, usage.library_id, library.machine_name,
                           library.major_version, library.minor_version, library.patch_version,
                           library.preloaded_js, library.preloaded_css,
                           usage.drop_css, usage.dependency_type, usage.weight
                    FROM content_library_usage usage
                    JOIN libraries library ON library.id = usage.library_id
                    WHERE usage.content_id = ?1";

        let mut loaded = Vec::new();
        match dependency_type {
            Some(filter) => {
                let sql = format!("{base} AND usage.dependency_type = ?2 ORDER BY usage.weight");
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![content_id.get(), filter], usage_from_row)?;
                for row in rows {
                    loaded.push(row?);
                }
            }
            None => {
                let sql = format!("{base} ORDER BY usage.weight");
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![content_id.get()], usage_from_row)?;
                for row in rows {
                    loaded.push(row?);
                }
            }
        }
        Ok(loaded)
    }

    /// Replaces `to`'s usage rows with a copy of `from`'s, flags and
    /// weights preserved. Used when content is cloned.
    pub fn copy_usage(&self, from: ContentId, to: ContentId) -> Result<(), RegistryError> {
        let tx = write_transaction(self.conn)?;
        tx.execute(
            "DELETE FROM content_library_usage WHERE content_id = ?1",
            params![to.get()],
        )?;
        tx.execute(
            "INSERT INTO content_library_usage
                (content_id, library_id, dependency_type, weight, drop_css)
             SELECT ?2, library_id, dependency_type, weight, drop_css
             FROM content_library_usage WHERE content_id = ?1",
            params![from.get(), to.get()],
        )?;
        tx.commit().map_err(RegistryError::Transaction)
    }

    /// Removes every usage row of a content instance. Removing rows for
    /// content that has none is a no-op.
    pub fn delete_usage(&self, content_id: ContentId) -> Result<(), RegistryError> {
        self.conn.execute(
            "DELETE FROM content_library_usage WHERE content_id = ?1",
            params![content_id.get()],
        )?;
        Ok(())
    }
}

fn usage_from_row(row: &Row<'_>) -> rusqlite::Result<ContentDependency> {
    Ok(ContentDependency {
        content_id: ContentId::new(row.get(0)?),
        library_id: LibraryId::new(row.get(1)?),
        machine_name: row.get(2)?,
        major_version: row.get(3)?,
        minor_version: row.get(4)?,
        patch_version: row.get(5)?,
        preloaded_js: csv_split(&row.get::<_, String>(6)?),
        preloaded_css: csv_split(&row.get::<_, String>(7)?),
        drop_css: row.get(8)?,
        dependency_type: row.get(9)?,
        weight: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LibraryInputBuilder;
    use crate::store::Registry;

    fn install(registry: &Registry, machine_name: &str, drops: &[&str]) -> LibraryId {
        let input = LibraryInputBuilder::new()
            .machine_name(machine_name)
            .title(machine_name)
            .version(1, 0, 0)
            .preloaded_js(vec![format!("{machine_name}.js")])
            .preloaded_css(vec![format!("{machine_name}.css")])
            .drop_library_css(drops.iter().map(|name| name.to_string()).collect())
            .build();
        registry.libraries().save(&input, true).unwrap()
    }

    #[test]
    fn load_usage_ascends_by_weight_for_any_insertion_order() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);
        let b = install(&registry, "H5P.B", &[]);
        let c = install(&registry, "H5P.C", &[]);

        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(c, DependencyType::Preloaded, 3),
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(b, DependencyType::Preloaded, 2),
                ],
            )
            .unwrap();

        let loaded = registry.usage().load_usage(ContentId::new(1), None).unwrap();
        assert_eq!(
            loaded.iter().map(|row| row.weight).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(loaded[0].library_id, a);
        assert_eq!(loaded[2].library_id, c);
    }

    #[test]
    fn drop_css_flags_are_order_independent() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &["H5P.B"]);
        let b = install(&registry, "H5P.B", &[]);

        let forward = [
            UsageEntry::new(a, DependencyType::Preloaded, 1),
            UsageEntry::new(b, DependencyType::Preloaded, 2),
        ];
        let reversed = [
            UsageEntry::new(b, DependencyType::Preloaded, 2),
            UsageEntry::new(a, DependencyType::Preloaded, 1),
        ];

        for entries in [&forward[..], &reversed[..]] {
            registry
                .usage()
                .replace_usage(ContentId::new(1), entries)
                .unwrap();

            let loaded = registry.usage().load_usage(ContentId::new(1), None).unwrap();
            let by_name = |name: &str| {
                loaded
                    .iter()
                    .find(|row| row.machine_name == name)
                    .unwrap()
                    .drop_css
            };
            assert!(!by_name("H5P.A"));
            assert!(by_name("H5P.B"));
        }
    }

    #[test]
    fn replace_usage_discards_rows_missing_from_the_new_set() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);
        let b = install(&registry, "H5P.B", &[]);

        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(b, DependencyType::Preloaded, 2),
                ],
            )
            .unwrap();
        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[UsageEntry::new(b, DependencyType::Preloaded, 1)],
            )
            .unwrap();

        let loaded = registry.usage().load_usage(ContentId::new(1), None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].library_id, b);
    }

    #[test]
    fn load_usage_filters_by_dependency_type() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);
        let b = install(&registry, "H5P.B", &[]);

        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(b, DependencyType::Dynamic, 2),
                ],
            )
            .unwrap();

        let dynamic = registry
            .usage()
            .load_usage(ContentId::new(1), Some(DependencyType::Dynamic))
            .unwrap();
        assert_eq!(dynamic.len(), 1);
        assert_eq!(dynamic[0].library_id, b);
        assert_eq!(dynamic[0].dependency_type, DependencyType::Dynamic);

        let all = registry.usage().load_usage(ContentId::new(1), None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn loaded_rows_carry_the_library_data_asset_assembly_needs() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);

        registry
            .usage()
            .replace_usage(
                ContentId::new(5),
                &[UsageEntry::new(a, DependencyType::Preloaded, 1)],
            )
            .unwrap();

        let loaded = registry.usage().load_usage(ContentId::new(5), None).unwrap();
        let row = &loaded[0];
        assert_eq!(row.content_id, ContentId::new(5));
        assert_eq!(row.machine_name, "H5P.A");
        assert_eq!(row.major_version, 1);
        assert_eq!(row.minor_version, 0);
        assert_eq!(row.preloaded_js, vec!["H5P.A.js".to_string()]);
        assert_eq!(row.preloaded_css, vec!["H5P.A.css".to_string()]);
        assert_eq!(row.folder_name(), "H5P.A-1.0");
    }

    #[test]
    fn copy_usage_replaces_the_target_rows_with_the_source_set() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &["H5P.B"]);
        let b = install(&registry, "H5P.B", &[]);
        let c = install(&registry, "H5P.C", &[]);

        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(b, DependencyType::Preloaded, 2),
                ],
            )
            .unwrap();
        registry
            .usage()
            .replace_usage(
                ContentId::new(2),
                &[UsageEntry::new(c, DependencyType::Editor, 1)],
            )
            .unwrap();

        registry
            .usage()
            .copy_usage(ContentId::new(1), ContentId::new(2))
            .unwrap();

        let copied = registry.usage().load_usage(ContentId::new(2), None).unwrap();
        assert_eq!(copied.len(), 2);
        assert_eq!(copied[0].library_id, a);
        assert!(!copied[0].drop_css);
        assert_eq!(copied[1].library_id, b);
        assert!(copied[1].drop_css);

        // The source is untouched.
        assert_eq!(
            registry.usage().load_usage(ContentId::new(1), None).unwrap().len(),
            2
        );
    }

    #[test]
    fn delete_usage_clears_rows_and_is_idempotent() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);
        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[UsageEntry::new(a, DependencyType::Preloaded, 1)],
            )
            .unwrap();

        registry.usage().delete_usage(ContentId::new(1)).unwrap();
        assert!(registry.usage().load_usage(ContentId::new(1), None).unwrap().is_empty());

        registry.usage().delete_usage(ContentId::new(1)).unwrap();
    }

    #[test]
    fn an_entry_for_an_unknown_library_rejects_the_batch() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);
        registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[UsageEntry::new(a, DependencyType::Preloaded, 1)],
            )
            .unwrap();

        let err = registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(LibraryId::new(404), DependencyType::Dynamic, 2),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::LibraryIdNotFound(_)));

        // The prior rows survive the failed rewrite.
        assert_eq!(
            registry.usage().load_usage(ContentId::new(1), None).unwrap().len(),
            1
        );
    }

    #[test]
    fn the_same_library_and_type_cannot_appear_twice() {
        let registry = Registry::builder().build().unwrap();
        let a = install(&registry, "H5P.A", &[]);

        let err = registry
            .usage()
            .replace_usage(
                ContentId::new(1),
                &[
                    UsageEntry::new(a, DependencyType::Preloaded, 1),
                    UsageEntry::new(a, DependencyType::Preloaded, 2),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::Constraint { .. }));
        assert!(registry.usage().load_usage(ContentId::new(1), None).unwrap().is_empty());
    }
}
