//! Database schema and migrations.
//!
//! Pivot tables (`{entry_table}_{field}`) are not listed here: they depend
//! on the entries a field is attached to and are created through
//! [`crate::field::PivotTable::create`].

/// Database migrations, applied in order and tracked in `schema_version`.
pub const MIGRATIONS: &[&str] = &[
    // v1: Folders
    r#"
CREATE TABLE folders (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    slug            TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    description     TEXT,
    allowed_types   TEXT NOT NULL DEFAULT '',   -- comma-separated extensions, empty = any
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Files
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_id   INTEGER NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,              -- original filename
    stored_name TEXT NOT NULL UNIQUE,       -- UUID.ext in storage
    extension   TEXT NOT NULL,
    mime_type   TEXT NOT NULL,
    size        INTEGER NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_created_at ON files(created_at);
"#,
];
