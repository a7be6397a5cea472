use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LibraryId, LibraryVersionKey};

/// An installed library as stored in the registry.
///
/// Libraries are the unit of installation: a named, versioned bundle of
/// scripts, styles and semantics that content instances and other
/// libraries depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Unique identifier from the database.
    pub id: LibraryId,
    pub machine_name: String,
    pub title: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    /// Whether this library can be the root of a content instance.
    pub runnable: bool,
    pub fullscreen: bool,
    /// Embed modes the library supports (`div`, `iframe`).
    pub embed_types: Vec<String>,
    /// Script paths relative to the library folder, in load order.
    pub preloaded_js: Vec<String>,
    /// Stylesheet paths relative to the library folder, in load order.
    pub preloaded_css: Vec<String>,
    /// Machine names whose stylesheets this library suppresses.
    pub drop_library_css: Vec<String>,
    /// Raw semantics definition, kept as the JSON text it arrived as.
    pub semantics: Option<String>,
    pub has_icon: bool,
    pub tutorial_url: Option<String>,
}

impl Library {
    /// The versioned address of this library, patch included.
    pub fn key(&self) -> LibraryVersionKey {
        LibraryVersionKey::new(
            self.machine_name.clone(),
            self.major_version,
            self.minor_version,
        )
        .with_patch(self.patch_version)
    }

    /// On-disk folder name, `Name-major.minor`.
    pub fn folder_name(&self) -> String {
        self.key().folder_name()
    }
}

/// Payload for saving a library, new or updated.
///
/// Carries everything a library upload provides. On update the
/// `(machine_name, major_version, minor_version)` tuple addresses the
/// existing row and stays immutable; the remaining fields overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryInput {
    pub machine_name: String,
    pub title: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    pub runnable: bool,
    pub fullscreen: bool,
    pub embed_types: Vec<String>,
    pub preloaded_js: Vec<String>,
    pub preloaded_css: Vec<String>,
    pub drop_library_css: Vec<String>,
    pub semantics: Option<String>,
    pub has_icon: bool,
    /// Language packs shipped with the upload, language code to JSON text.
    /// Replaces the stored set on every save.
    pub translations: BTreeMap<String, String>,
}

impl LibraryInput {
    /// The versioned address this payload saves to.
    pub fn key(&self) -> LibraryVersionKey {
        LibraryVersionKey::new(
            self.machine_name.clone(),
            self.major_version,
            self.minor_version,
        )
        .with_patch(self.patch_version)
    }
}

/// Builder for constructing `LibraryInput` values with optional fields.
///
/// # Examples
///
/// ```
/// use lectern::LibraryInputBuilder;
///
/// let input = LibraryInputBuilder::new()
///     .machine_name("H5P.Accordion")
///     .title("Accordion")
///     .version(1, 4, 2)
///     .runnable(true)
///     .preloaded_js(vec!["js/accordion.js".into()])
///     .build();
///
/// assert_eq!(input.machine_name, "H5P.Accordion");
/// assert_eq!(input.patch_version, 2);
/// assert!(input.embed_types.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct LibraryInputBuilder {
    machine_name: Option<String>,
    title: Option<String>,
    major_version: Option<u32>,
    minor_version: Option<u32>,
    patch_version: u32,
    runnable: bool,
    fullscreen: bool,
    embed_types: Vec<String>,
    preloaded_js: Vec<String>,
    preloaded_css: Vec<String>,
    drop_library_css: Vec<String>,
    semantics: Option<String>,
    has_icon: bool,
    translations: BTreeMap<String, String>,
}

impl LibraryInputBuilder {
    /// Creates a new `LibraryInputBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the machine name.
    pub fn machine_name(mut self, machine_name: impl Into<String>) -> Self {
        self.machine_name = Some(machine_name.into());
        self
    }

    /// Sets the human-readable title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets major, minor and patch versions in one call.
    pub fn version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.major_version = Some(major);
        self.minor_version = Some(minor);
        self.patch_version = patch;
        self
    }

    /// Marks the library as runnable.
    pub fn runnable(mut self, runnable: bool) -> Self {
        self.runnable = runnable;
        self
    }

    /// Marks the library as fullscreen-capable.
    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Sets the supported embed types.
    pub fn embed_types(mut self, embed_types: Vec<String>) -> Self {
        self.embed_types = embed_types;
        self
    }

    /// Sets the preloaded script paths.
    pub fn preloaded_js(mut self, preloaded_js: Vec<String>) -> Self {
        self.preloaded_js = preloaded_js;
        self
    }

    /// Sets the preloaded stylesheet paths.
    pub fn preloaded_css(mut self, preloaded_css: Vec<String>) -> Self {
        self.preloaded_css = preloaded_css;
        self
    }

    /// Sets the machine names whose CSS this library drops.
    pub fn drop_library_css(mut self, drop_library_css: Vec<String>) -> Self {
        self.drop_library_css = drop_library_css;
        self
    }

    /// Sets the semantics JSON text.
    pub fn semantics(mut self, semantics: impl Into<String>) -> Self {
        self.semantics = Some(semantics.into());
        self
    }

    /// Marks the library as shipping its own icon.
    pub fn has_icon(mut self, has_icon: bool) -> Self {
        self.has_icon = has_icon;
        self
    }

    /// Adds a language pack for the given language code.
    pub fn translation(
        mut self,
        language_code: impl Into<String>,
        json: impl Into<String>,
    ) -> Self {
        self.translations.insert(language_code.into(), json.into());
        self
    }

    /// Builds the `LibraryInput`.
    ///
    /// # Panics
    ///
    /// Panics if `machine_name`, `title` or `version` have not been set.
    pub fn build(self) -> LibraryInput {
        LibraryInput {
            machine_name: self.machine_name.expect("machine_name is required"),
            title: self.title.expect("title is required"),
            major_version: self.major_version.expect("version is required"),
            minor_version: self.minor_version.expect("version is required"),
            patch_version: self.patch_version,
            runnable: self.runnable,
            fullscreen: self.fullscreen,
            embed_types: self.embed_types,
            preloaded_js: self.preloaded_js,
            preloaded_css: self.preloaded_css,
            drop_library_css: self.drop_library_css,
            semantics: self.semantics,
            has_icon: self.has_icon,
            translations: self.translations,
        }
    }
}

/// Joins a path list into its stored comma-separated form.
pub(crate) fn csv_join(items: &[String]) -> String {
    items.join(", ")
}

/// Splits a stored comma-separated list, trimming entries and dropping
/// empties so `""` and `"a, , b"` behave.
pub(crate) fn csv_split(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_defaults() {
        let input = LibraryInputBuilder::new()
            .machine_name("H5P.Chart")
            .title("Chart")
            .version(1, 2, 0)
            .build();

        assert_eq!(input.patch_version, 0);
        assert!(!input.runnable);
        assert!(input.preloaded_js.is_empty());
        assert!(input.semantics.is_none());
        assert!(input.translations.is_empty());
    }

    #[test]
    fn test_input_key_carries_patch() {
        let input = LibraryInputBuilder::new()
            .machine_name("H5P.Chart")
            .title("Chart")
            .version(1, 2, 7)
            .build();

        let key = input.key();
        assert_eq!(key.patch_version, Some(7));
        assert_eq!(key.folder_name(), "H5P.Chart-1.2");
    }

    #[test]
    fn test_csv_join_uses_comma_space() {
        let items = vec!["js/a.js".to_string(), "js/b.js".to_string()];
        assert_eq!(csv_join(&items), "js/a.js, js/b.js");
        assert_eq!(csv_join(&[]), "");
    }

    #[test]
    fn test_csv_split_trims_and_drops_empties() {
        assert_eq!(
            csv_split("js/a.js, js/b.js"),
            vec!["js/a.js".to_string(), "js/b.js".to_string()]
        );
        assert_eq!(csv_split(""), Vec::<String>::new());
        assert_eq!(csv_split("a, , b,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_split_undoes_join() {
        let items = vec!["styles/main.css".to_string(), "styles/extra.css".to_string()];
        assert_eq!(csv_split(&csv_join(&items)), items);
    }
}
