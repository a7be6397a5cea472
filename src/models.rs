mod catalog;
mod dependency;
mod ids;
mod library;
mod usage;
mod version;

pub use catalog::{CatalogEntry, HubContentType, HubCoreApi, HubVersion};
pub use dependency::{DependencySet, DependencyType};
pub use ids::{ContentId, LibraryId};
pub use library::{Library, LibraryInput, LibraryInputBuilder};
pub(crate) use library::{csv_join, csv_split};
pub use usage::{ContentDependency, UsageEntry};
pub use version::LibraryVersionKey;
