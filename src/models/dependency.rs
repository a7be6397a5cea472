use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::LibraryVersionKey;

/// How a depending library pulls in a required one.
///
/// Preloaded dependencies load with the library, dynamic ones load on
/// demand at runtime, editor ones only inside the authoring tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Preloaded,
    Dynamic,
    Editor,
}

impl DependencyType {
    /// Every dependency type, in grouping order.
    pub const ALL: [DependencyType; 3] = [Self::Preloaded, Self::Dynamic, Self::Editor];

    /// The stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preloaded => "preloaded",
            Self::Dynamic => "dynamic",
            Self::Editor => "editor",
        }
    }

    /// Parses the stored string form.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "preloaded" => Some(Self::Preloaded),
            "dynamic" => Some(Self::Dynamic),
            "editor" => Some(Self::Editor),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for DependencyType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DependencyType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown dependency type: {text}").into()))
    }
}

/// A library's dependencies grouped by type.
///
/// Serializes with the `preloadedDependencies` / `dynamicDependencies` /
/// `editorDependencies` keys the rendering side expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySet {
    #[serde(rename = "preloadedDependencies")]
    pub preloaded: Vec<LibraryVersionKey>,
    #[serde(rename = "dynamicDependencies")]
    pub dynamic: Vec<LibraryVersionKey>,
    #[serde(rename = "editorDependencies")]
    pub editor: Vec<LibraryVersionKey>,
}

impl DependencySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The keys of the given type.
    pub fn of_type(&self, dependency_type: DependencyType) -> &[LibraryVersionKey] {
        match dependency_type {
            DependencyType::Preloaded => &self.preloaded,
            DependencyType::Dynamic => &self.dynamic,
            DependencyType::Editor => &self.editor,
        }
    }

    /// Appends a key under the given type.
    pub fn push(&mut self, dependency_type: DependencyType, key: LibraryVersionKey) {
        match dependency_type {
            DependencyType::Preloaded => self.preloaded.push(key),
            DependencyType::Dynamic => self.dynamic.push(key),
            DependencyType::Editor => self.editor.push(key),
        }
    }

    /// Total number of edges across all types.
    pub fn len(&self) -> usize {
        self.preloaded.len() + self.dynamic.len() + self.editor.len()
    }

    /// True when no type has any edge.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
