use thiserror::Error;

use crate::models::{LibraryId, LibraryVersionKey};

/// Errors produced by the registry stores.
///
/// Every fallible store operation reports through this enum; nothing is
/// swallowed into sentinel values.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No installed library matches the given version key.
    #[error("library {0} is not installed")]
    LibraryNotFound(LibraryVersionKey),

    /// No library row with the given ID exists.
    #[error("no library with id {0}")]
    LibraryIdNotFound(LibraryId),

    /// No installed library has the given machine name, in any version.
    #[error("no installed library is named {0}")]
    MachineNameNotFound(String),

    /// A dependency batch referenced a version key that resolves to no
    /// installed library. The whole batch is rejected.
    #[error("unresolved dependency: {0}")]
    UnresolvedDependency(LibraryVersionKey),

    /// A save with `is_new` claimed a version tuple that already exists.
    #[error("library {0} is already installed")]
    DuplicateVersion(LibraryVersionKey),

    /// A database constraint rejected the write (self-dependency, row
    /// still referenced, duplicate key).
    #[error("constraint violated: {message}")]
    Constraint { message: String },

    /// A catalog replacement was asked to install zero entries; the
    /// existing cache is kept instead.
    #[error("refusing to replace the catalog cache with an empty entry list")]
    EmptyCatalog,

    /// A transaction could not be committed.
    #[error("transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),

    /// The asset store failed to remove a deleted library's folder.
    #[error("asset removal failed: {0}")]
    Assets(#[source] std::io::Error),

    /// Serialization of a stored JSON value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for RegistryError {
    /// Classifies constraint failures so callers can tell a rejected
    /// write from a broken database.
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint {
                    message: message.clone().unwrap_or_else(|| code.to_string()),
                }
            }
            _ => Self::Database(err),
        }
    }
}
