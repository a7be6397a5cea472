use rusqlite::{Connection, params};

use crate::error::RegistryError;
use crate::lock::DependencyLocks;
use crate::models::{DependencySet, DependencyType, LibraryId, LibraryVersionKey};

use super::{resolve_library_id, write_transaction};

/// Typed dependency edges between installed libraries.
pub struct DependencyGraphStore<'a> {
    conn: &'a Connection,
    locks: &'a DependencyLocks,
}

impl<'a> DependencyGraphStore<'a> {
    pub(crate) fn new(conn: &'a Connection, locks: &'a DependencyLocks) -> Self {
        Self { conn, locks }
    }

    /// Replaces a library's edges of one dependency type with the given
    /// requirements.
    ///
    /// Every requirement resolves to an installed library before any
    /// row is touched; a single unresolved entry rejects the whole
    /// batch and leaves the stored set exactly as it was. The rewrite
    /// itself is one transaction, and concurrent rewrites for the same
    /// library are serialized through the shared lock table.
    pub fn replace_dependencies(
        &self,
        library_id: LibraryId,
        requirements: &[LibraryVersionKey],
        dependency_type: DependencyType,
    ) -> Result<(), RegistryError> {
        self.locks.with_library(library_id, || {
            let tx = write_transaction(self.conn)?;

            if !library_exists(&tx, library_id)? {
                return Err(RegistryError::LibraryIdNotFound(library_id));
            }

            let mut required_ids = Vec::with_capacity(requirements.len());
            for requirement in requirements {
                match resolve_library_id(&tx, requirement)? {
                    Some(id) => required_ids.push(id),
                    None => {
                        return Err(RegistryError::UnresolvedDependency(requirement.clone()));
                    }
                }
            }

            tx.execute(
                "DELETE FROM library_dependencies
                 WHERE library_id = ?1 AND dependency_type = ?2",
                params![library_id.get(), dependency_type],
            )?;
            for required_id in required_ids {
                tx.execute(
                    "INSERT INTO library_dependencies
                        (library_id, required_library_id, dependency_type)
                     VALUES (?1, ?2, ?3)",
                    params![library_id.get(), required_id, dependency_type],
                )?;
            }

            tx.commit().map_err(RegistryError::Transaction)
        })
    }

    /// Loads a library's outgoing edges grouped by type.
    pub fn load_dependencies(
        &self,
        library_id: LibraryId,
    ) -> Result<DependencySet, RegistryError> {
        if !library_exists(self.conn, library_id)? {
            return Err(RegistryError::LibraryIdNotFound(library_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT required.machine_name, required.major_version, required.minor_version,
                    edge.dependency_type
             FROM library_dependencies edge
             JOIN libraries required ON required.id = edge.required_library_id
             WHERE edge.library_id = ?1
             ORDER BY edge.dependency_type, required.machine_name",
        )?;
        let rows = stmt.query_map(params![library_id.get()], |row| {
            let required = LibraryVersionKey::new(
                row.get::<_, String>(0)?,
                row.get(1)?,
                row.get(2)?,
            );
            Ok((row.get::<_, DependencyType>(3)?, required))
        })?;

        let mut set = DependencySet::new();
        for row in rows {
            let (dependency_type, required) = row?;
            set.push(dependency_type, required);
        }
        Ok(set)
    }
}

fn library_exists(conn: &Connection, library_id: LibraryId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM libraries WHERE id = ?1)",
        params![library_id.get()],
        |row| row.get(0),
    )
}
