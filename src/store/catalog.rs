use rusqlite::{Connection, Row, params};

use crate::error::RegistryError;
use crate::models::CatalogEntry;

use super::write_transaction;

/// The locally mirrored hub catalog.
pub struct CatalogCacheStore<'a> {
    conn: &'a Connection,
}

impl<'a> CatalogCacheStore<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Replaces the whole mirrored catalog with the given entries and
    /// returns how many were installed.
    ///
    /// An empty entry list is refused with `EmptyCatalog` so a broken
    /// refresh can never wipe the mirror. Truncate and insert run in
    /// one transaction; readers see the old catalog or the new one,
    /// never a mix.
    pub fn replace_catalog(&self, entries: &[CatalogEntry]) -> Result<usize, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::EmptyCatalog);
        }

        let tx = write_transaction(self.conn)?;
        tx.execute("DELETE FROM hub_cache", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO hub_cache (
                    machine_name, major_version, minor_version, patch_version,
                    core_major, core_minor, title, summary, description, icon_url,
                    created_at, updated_at, is_recommended, popularity,
                    screenshots, license, keywords, categories,
                    example_url, tutorial_url, owner
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                           ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.machine_name,
                    entry.major_version,
                    entry.minor_version,
                    entry.patch_version,
                    entry.core_major,
                    entry.core_minor,
                    entry.title,
                    entry.summary,
                    entry.description,
                    entry.icon_url,
                    entry.created_at,
                    entry.updated_at,
                    entry.is_recommended,
                    entry.popularity,
                    entry.screenshots,
                    entry.license,
                    entry.keywords,
                    entry.categories,
                    entry.example_url,
                    entry.tutorial_url,
                    entry.owner,
                ])?;
            }
        }
        tx.commit().map_err(RegistryError::Transaction)?;
        Ok(entries.len())
    }

    /// Every mirrored entry, ordered by machine name.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, RegistryError> {
        let mut stmt = self.conn.prepare(
            "SELECT machine_name, major_version, minor_version, patch_version,
                    core_major, core_minor, title, summary, description, icon_url,
                    created_at, updated_at, is_recommended, popularity,
                    screenshots, license, keywords, categories,
                    example_url, tutorial_url, owner
             FROM hub_cache ORDER BY machine_name",
        )?;
        let rows = stmt.query_map([], catalog_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Number of mirrored entries.
    pub fn count(&self) -> Result<i64, RegistryError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM hub_cache", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn catalog_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        machine_name: row.get(0)?,
        major_version: row.get(1)?,
        minor_version: row.get(2)?,
        patch_version: row.get(3)?,
        core_major: row.get(4)?,
        core_minor: row.get(5)?,
        title: row.get(6)?,
        summary: row.get(7)?,
        description: row.get(8)?,
        icon_url: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        is_recommended: row.get(12)?,
        popularity: row.get(13)?,
        screenshots: row.get(14)?,
        license: row.get(15)?,
        keywords: row.get(16)?,
        categories: row.get(17)?,
        example_url: row.get(18)?,
        tutorial_url: row.get(19)?,
        owner: row.get(20)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Registry;

    fn entry(machine_name: &str) -> CatalogEntry {
        CatalogEntry {
            machine_name: machine_name.to_string(),
            major_version: 1,
            minor_version: 4,
            patch_version: 7,
            core_major: 1,
            core_minor: 24,
            title: machine_name.trim_start_matches("H5P.").to_string(),
            summary: "A content type".to_string(),
            description: "Longer words about the content type.".to_string(),
            icon_url: format!("https://hub.example.org/{machine_name}.svg"),
            created_at: 1469181392,
            updated_at: 1677672000,
            is_recommended: machine_name.ends_with("Accordion"),
            popularity: 17,
            screenshots: r#"[{"url":"https://hub.example.org/1.png"}]"#.to_string(),
            license: r#"{"id":"MIT"}"#.to_string(),
            keywords: r#"["text"]"#.to_string(),
            categories: "[]".to_string(),
            example_url: "https://hub.example.org/example".to_string(),
            tutorial_url: String::new(),
            owner: "Joubel".to_string(),
        }
    }

    #[test]
    fn replace_installs_the_whole_catalog() {
        let registry = Registry::builder().build().unwrap();

        let installed = registry
            .catalog()
            .replace_catalog(&[entry("H5P.Chart"), entry("H5P.Accordion")])
            .unwrap();

        assert_eq!(installed, 2);
        assert_eq!(registry.catalog().count().unwrap(), 2);
        let names: Vec<String> = registry
            .catalog()
            .entries()
            .unwrap()
            .into_iter()
            .map(|entry| entry.machine_name)
            .collect();
        assert_eq!(names, vec!["H5P.Accordion", "H5P.Chart"]);
    }

    #[test]
    fn replace_discards_the_previous_catalog() {
        let registry = Registry::builder().build().unwrap();
        registry
            .catalog()
            .replace_catalog(&[entry("H5P.Old")])
            .unwrap();

        registry
            .catalog()
            .replace_catalog(&[entry("H5P.New")])
            .unwrap();

        let names: Vec<String> = registry
            .catalog()
            .entries()
            .unwrap()
            .into_iter()
            .map(|entry| entry.machine_name)
            .collect();
        assert_eq!(names, vec!["H5P.New"]);
    }

    #[test]
    fn an_empty_replacement_is_refused_and_keeps_the_mirror() {
        let registry = Registry::builder().build().unwrap();
        registry
            .catalog()
            .replace_catalog(&[entry("H5P.Accordion")])
            .unwrap();

        let err = registry.catalog().replace_catalog(&[]).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyCatalog));
        assert_eq!(registry.catalog().count().unwrap(), 1);
    }

    #[test]
    fn stored_entries_round_trip_every_column() {
        let registry = Registry::builder().build().unwrap();
        let original = entry("H5P.Accordion");

        registry.catalog().replace_catalog(&[original.clone()]).unwrap();
        let loaded = registry.catalog().entries().unwrap();

        assert_eq!(loaded, vec![original]);
    }
}
