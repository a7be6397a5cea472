use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::RegistryError;

/// JSON-typed registry options.
///
/// A small name-to-value table for flags the registry and its callers
/// share, such as developer mode or whether a runnable library has ever
/// been installed.
pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    /// Option that makes every version count as a patch upgrade, so
    /// a library under development can be re-installed.
    pub const DEV_MODE: &'static str = "dev_mode";

    /// Option flipped to `true` the first time a runnable library is
    /// saved. Installers read it to adjust onboarding.
    pub const FIRST_RUNNABLE_SAVED: &'static str = "first_runnable_saved";

    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reads an option, `None` when it was never set.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, RegistryError> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Writes an option, overwriting any prior value.
    pub fn set<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), RegistryError> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, json],
        )?;
        Ok(())
    }
}
