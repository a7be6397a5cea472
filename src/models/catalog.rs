use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::LibraryVersionKey;

/// One content type as it appears in the hub catalog document.
///
/// Mirrors the upstream JSON field names. Optional collections default
/// so a sparse entry still parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubContentType {
    /// The hub calls the machine name `id`.
    pub id: String,
    pub version: HubVersion,
    pub core_api_version_needed: HubCoreApi,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub screenshots: serde_json::Value,
    #[serde(default)]
    pub license: serde_json::Value,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub tutorial: String,
    #[serde(default)]
    pub keywords: serde_json::Value,
    #[serde(default)]
    pub categories: serde_json::Value,
    #[serde(default)]
    pub owner: String,
}

/// `major.minor.patch` of a hub content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Minimum runtime API a hub content type needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubCoreApi {
    pub major: u32,
    pub minor: u32,
}

/// A mirrored catalog row as stored locally.
///
/// Structured fields the registry queries on are real columns;
/// screenshots, license, keywords and categories stay opaque JSON text,
/// handed back verbatim to whoever renders the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    pub core_major: u32,
    pub core_minor: u32,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub icon_url: String,
    /// Unix timestamps, converted from the hub's RFC 3339 strings.
    pub created_at: i64,
    pub updated_at: i64,
    pub is_recommended: bool,
    pub popularity: i64,
    pub screenshots: String,
    pub license: String,
    pub keywords: String,
    pub categories: String,
    pub example_url: String,
    pub tutorial_url: String,
    pub owner: String,
}

impl CatalogEntry {
    /// The versioned address of the advertised content type.
    pub fn key(&self) -> LibraryVersionKey {
        LibraryVersionKey::new(
            self.machine_name.clone(),
            self.major_version,
            self.minor_version,
        )
        .with_patch(self.patch_version)
    }
}

impl From<HubContentType> for CatalogEntry {
    fn from(content_type: HubContentType) -> Self {
        Self {
            machine_name: content_type.id,
            major_version: content_type.version.major,
            minor_version: content_type.version.minor,
            patch_version: content_type.version.patch,
            core_major: content_type.core_api_version_needed.major,
            core_minor: content_type.core_api_version_needed.minor,
            title: content_type.title,
            summary: content_type.summary,
            description: content_type.description,
            icon_url: content_type.icon,
            created_at: content_type.created_at.unix_timestamp(),
            updated_at: content_type.updated_at.unix_timestamp(),
            is_recommended: content_type.is_recommended,
            popularity: content_type.popularity,
            screenshots: json_blob(content_type.screenshots),
            license: json_blob(content_type.license),
            keywords: json_blob(content_type.keywords),
            categories: json_blob(content_type.categories),
            example_url: content_type.example,
            tutorial_url: content_type.tutorial,
            owner: content_type.owner,
        }
    }
}

/// Serializes a catalog collection field, mapping an absent value to an
/// empty list rather than JSON `null`.
fn json_blob(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "[]".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUB_ENTRY: &str = r#"{
        "id": "H5P.Accordion",
        "version": {"major": 1, "minor": 0, "patch": 33},
        "coreApiVersionNeeded": {"major": 1, "minor": 24},
        "title": "Accordion",
        "summary": "Create vertically stacked expandable items",
        "description": "Reduce the amount of text presented to readers.",
        "icon": "https://hub.example.org/icons/accordion.svg",
        "createdAt": "2016-07-22T09:56:32.000Z",
        "updatedAt": "2023-03-01T12:00:00.000Z",
        "isRecommended": true,
        "popularity": 17,
        "screenshots": [{"url": "https://hub.example.org/shots/1.png"}],
        "license": {"id": "MIT"},
        "example": "https://hub.example.org/examples/accordion",
        "keywords": ["text", "collapse"],
        "owner": "Joubel"
    }"#;

    #[test]
    fn parses_hub_entry_and_converts_timestamps() {
        let content_type: HubContentType = serde_json::from_str(HUB_ENTRY).unwrap();
        assert_eq!(content_type.id, "H5P.Accordion");
        assert_eq!(content_type.version.patch, 33);
        assert_eq!(content_type.core_api_version_needed.minor, 24);

        let entry = CatalogEntry::from(content_type);
        assert_eq!(entry.machine_name, "H5P.Accordion");
        assert_eq!(entry.created_at, 1469181392);
        assert!(entry.updated_at > entry.created_at);
        assert!(entry.is_recommended);
    }

    #[test]
    fn missing_collections_become_empty_lists() {
        let content_type: HubContentType = serde_json::from_str(HUB_ENTRY).unwrap();
        let entry = CatalogEntry::from(content_type);

        // categories and tutorial are absent from the document
        assert_eq!(entry.categories, "[]");
        assert_eq!(entry.tutorial_url, "");

        // present collections keep their content
        assert_eq!(entry.keywords, r#"["text","collapse"]"#);
        assert!(entry.screenshots.contains("shots/1.png"));
        assert_eq!(entry.license, r#"{"id":"MIT"}"#);
    }

    #[test]
    fn entry_key_uses_hub_version() {
        let content_type: HubContentType = serde_json::from_str(HUB_ENTRY).unwrap();
        let entry = CatalogEntry::from(content_type);
        let key = entry.key();
        assert_eq!(key.folder_name(), "H5P.Accordion-1.0");
        assert_eq!(key.patch_version, Some(33));
    }
}
