//! The remote content-type hub: catalog document, fetch seam, refresh.

mod client;

pub use client::{HubClient, HubClientBuilder, HubError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RegistryError;
use crate::models::{CatalogEntry, HubContentType};
use crate::store::CatalogCacheStore;

/// The document the hub serves: a `contentTypes` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub content_types: Vec<HubContentType>,
}

/// Source of hub catalog documents.
///
/// `HubClient` is the HTTP implementation; tests substitute canned
/// documents.
pub trait ContentTypeSource: Send + Sync {
    fn fetch_content_types(&self) -> Result<CatalogDocument, HubError>;
}

/// Errors from a catalog refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The hub could not be fetched or its document parsed. The
    /// mirrored catalog is untouched.
    #[error("catalog fetch failed: {0}")]
    Fetch(#[source] HubError),

    /// Storing the fetched catalog failed; this includes a fetch that
    /// came back with zero entries.
    #[error("catalog store failed: {0}")]
    Store(#[source] RegistryError),
}

/// Refreshes the mirrored catalog from a hub source and returns how
/// many entries were installed.
///
/// The fetch runs first and must succeed with a non-empty document
/// before any row is touched, so a hub outage can never empty the
/// local mirror.
pub fn refresh(
    source: &dyn ContentTypeSource,
    catalog: &CatalogCacheStore<'_>,
) -> Result<usize, RefreshError> {
    let document = source.fetch_content_types().map_err(RefreshError::Fetch)?;
    let entries: Vec<CatalogEntry> = document
        .content_types
        .into_iter()
        .map(CatalogEntry::from)
        .collect();
    catalog
        .replace_catalog(&entries)
        .map_err(RefreshError::Store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Registry;

    const DOCUMENT: &str = r#"{
        "contentTypes": [
            {
                "id": "H5P.Accordion",
                "version": {"major": 1, "minor": 0, "patch": 33},
                "coreApiVersionNeeded": {"major": 1, "minor": 24},
                "title": "Accordion",
                "createdAt": "2016-07-22T09:56:32.000Z",
                "updatedAt": "2023-03-01T12:00:00.000Z",
                "isRecommended": true
            },
            {
                "id": "H5P.Chart",
                "version": {"major": 1, "minor": 2, "patch": 1},
                "coreApiVersionNeeded": {"major": 1, "minor": 19},
                "title": "Chart",
                "createdAt": "2017-01-05T08:00:00.000Z",
                "updatedAt": "2022-11-11T09:30:00.000Z"
            }
        ]
    }"#;

    struct StubSource {
        document: Option<CatalogDocument>,
    }

    impl ContentTypeSource for StubSource {
        fn fetch_content_types(&self) -> Result<CatalogDocument, HubError> {
            self.document.clone().ok_or(HubError::Http { status: 503 })
        }
    }

    fn parsed() -> CatalogDocument {
        serde_json::from_str(DOCUMENT).unwrap()
    }

    #[test]
    fn document_parses_the_content_types_array() {
        let document = parsed();
        assert_eq!(document.content_types.len(), 2);
        assert_eq!(document.content_types[0].id, "H5P.Accordion");
        assert_eq!(document.content_types[1].version.minor, 2);
    }

    #[test]
    fn a_document_without_the_array_parses_as_empty() {
        let document: CatalogDocument = serde_json::from_str("{}").unwrap();
        assert!(document.content_types.is_empty());
    }

    #[test]
    fn refresh_installs_the_fetched_entries() {
        let registry = Registry::builder().build().unwrap();
        let source = StubSource {
            document: Some(parsed()),
        };

        let installed = refresh(&source, &registry.catalog()).unwrap();

        assert_eq!(installed, 2);
        let entries = registry.catalog().entries().unwrap();
        assert_eq!(entries[0].machine_name, "H5P.Accordion");
        assert!(entries[0].is_recommended);
        assert_eq!(entries[1].machine_name, "H5P.Chart");
        assert!(!entries[1].is_recommended);
    }

    #[test]
    fn a_failed_fetch_leaves_the_mirror_untouched() {
        let registry = Registry::builder().build().unwrap();
        let good = StubSource {
            document: Some(parsed()),
        };
        refresh(&good, &registry.catalog()).unwrap();

        let broken = StubSource { document: None };
        let err = refresh(&broken, &registry.catalog()).unwrap_err();

        assert!(matches!(err, RefreshError::Fetch(HubError::Http { status: 503 })));
        assert_eq!(registry.catalog().count().unwrap(), 2);
    }

    #[test]
    fn an_empty_document_leaves_the_mirror_untouched() {
        let registry = Registry::builder().build().unwrap();
        let good = StubSource {
            document: Some(parsed()),
        };
        refresh(&good, &registry.catalog()).unwrap();

        let empty = StubSource {
            document: Some(CatalogDocument::default()),
        };
        let err = refresh(&empty, &registry.catalog()).unwrap_err();

        assert!(matches!(err, RefreshError::Store(RegistryError::EmptyCatalog)));
        assert_eq!(registry.catalog().count().unwrap(), 2);
    }
}
