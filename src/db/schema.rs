/// Complete database schema for the library registry.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// All statements are designed to be run in a single batch.
pub const INITIAL_SCHEMA: &str = r#"
-- Installed libraries: one row per (machine_name, major, minor)
CREATE TABLE IF NOT EXISTS libraries (
    id INTEGER PRIMARY KEY,
    machine_name TEXT NOT NULL,
    title TEXT NOT NULL,
    major_version INTEGER NOT NULL,
    minor_version INTEGER NOT NULL,
    patch_version INTEGER NOT NULL DEFAULT 0,
    runnable INTEGER NOT NULL DEFAULT 0,
    fullscreen INTEGER NOT NULL DEFAULT 0,
    embed_types TEXT NOT NULL DEFAULT '',
    preloaded_js TEXT NOT NULL DEFAULT '',
    preloaded_css TEXT NOT NULL DEFAULT '',
    drop_library_css TEXT NOT NULL DEFAULT '',
    semantics TEXT,
    has_icon INTEGER NOT NULL DEFAULT 0,
    tutorial_url TEXT,
    UNIQUE (machine_name, major_version, minor_version)
);

-- Typed dependency edges between installed libraries
CREATE TABLE IF NOT EXISTS library_dependencies (
    library_id INTEGER NOT NULL,
    required_library_id INTEGER NOT NULL,
    dependency_type TEXT NOT NULL,
    PRIMARY KEY (library_id, required_library_id, dependency_type),
    FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE,
    FOREIGN KEY (required_library_id) REFERENCES libraries(id) ON DELETE CASCADE,
    CHECK (library_id <> required_library_id)
);

-- Which libraries each piece of platform content uses, with load order
-- and CSS suppression. RESTRICT keeps a used library from being deleted.
CREATE TABLE IF NOT EXISTS content_library_usage (
    content_id INTEGER NOT NULL,
    library_id INTEGER NOT NULL,
    dependency_type TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0,
    drop_css INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (content_id, library_id, dependency_type),
    FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE RESTRICT
);

-- Mirrored hub catalog, replaced wholesale on refresh
CREATE TABLE IF NOT EXISTS hub_cache (
    id INTEGER PRIMARY KEY,
    machine_name TEXT NOT NULL UNIQUE,
    major_version INTEGER NOT NULL,
    minor_version INTEGER NOT NULL,
    patch_version INTEGER NOT NULL DEFAULT 0,
    core_major INTEGER NOT NULL DEFAULT 0,
    core_minor INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    icon_url TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0,
    is_recommended INTEGER NOT NULL DEFAULT 0,
    popularity INTEGER NOT NULL DEFAULT 0,
    screenshots TEXT NOT NULL DEFAULT '[]',
    license TEXT NOT NULL DEFAULT '[]',
    keywords TEXT NOT NULL DEFAULT '[]',
    categories TEXT NOT NULL DEFAULT '[]',
    example_url TEXT NOT NULL DEFAULT '',
    tutorial_url TEXT NOT NULL DEFAULT '',
    owner TEXT NOT NULL DEFAULT ''
);

-- Language packs shipped with a library, replaced on every save
CREATE TABLE IF NOT EXISTS library_translations (
    library_id INTEGER NOT NULL,
    language_code TEXT NOT NULL,
    translation TEXT NOT NULL,
    PRIMARY KEY (library_id, language_code),
    FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE
);

-- Registry options as JSON values
CREATE TABLE IF NOT EXISTS settings (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Index for machine-name lookups across versions
CREATE INDEX IF NOT EXISTS idx_libraries_name ON libraries(machine_name);

-- Index for reverse dependency walks
CREATE INDEX IF NOT EXISTS idx_dependencies_required ON library_dependencies(required_library_id);

-- Indexes for usage lookups by content (in weight order) and by library
CREATE INDEX IF NOT EXISTS idx_usage_content_weight ON content_library_usage(content_id, weight);
CREATE INDEX IF NOT EXISTS idx_usage_library ON content_library_usage(library_id);
"#;
