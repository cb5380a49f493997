//! File metadata types and repository.

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{FieldTypeError, Result};

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Folder ID this file belongs to.
    pub folder_id: i64,
    /// Original filename (display name).
    pub name: String,
    /// Stored filename (UUID.ext format).
    pub stored_name: String,
    /// Lower-cased extension without the dot.
    pub extension: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
    /// When the file was uploaded.
    pub created_at: String,
}

impl FileRecord {
    /// All attributes as a JSON object.
    pub fn attributes(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Human-readable size.
    pub fn readable_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", self.size, UNITS[0])
        } else {
            format!("{size:.1} {}", UNITS[unit])
        }
    }
}

/// Data for creating a new file entry.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Folder ID this file belongs to.
    pub folder_id: i64,
    /// Original filename (display name).
    pub name: String,
    /// Stored filename (UUID.ext format).
    pub stored_name: String,
    /// Lower-cased extension.
    pub extension: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
}

impl NewFile {
    /// Create a new NewFile. Extension and MIME type are derived from the name.
    pub fn new(
        folder_id: i64,
        name: impl Into<String>,
        stored_name: impl Into<String>,
        size: i64,
    ) -> Self {
        let name = name.into();
        let extension = super::extension_of(&name);
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            folder_id,
            name,
            stored_name: stored_name.into(),
            extension,
            mime_type,
            size,
        }
    }

    /// Override the detected MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

const FILE_COLUMNS: &str =
    "id, folder_id, name, stored_name, extension, mime_type, size, created_at";

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new file entry.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let result = sqlx::query(
            "INSERT INTO files (folder_id, name, stored_name, extension, mime_type, size)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file.folder_id)
        .bind(&file.name)
        .bind(&file.stored_name)
        .bind(&file.extension)
        .bind(&file.mime_type)
        .bind(file.size)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FieldTypeError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// Get the files with the given IDs, newest first.
    ///
    /// Tokens that are not integers match nothing.
    pub async fn find_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<FileRecord>> {
        let ids: Vec<i64> = ids
            .iter()
            .filter_map(|id| id.as_ref().trim().parse().ok())
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {FILE_COLUMNS} FROM files WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY created_at DESC, id DESC");

        let files = builder
            .build_query_as::<FileRecord>()
            .fetch_all(self.pool)
            .await?;

        Ok(files)
    }

    /// List files in a folder (ordered by created_at descending).
    pub async fn list_by_folder(&self, folder_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE folder_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(folder_id)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Delete a file by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count files in a folder.
    pub async fn count_by_folder(&self, folder_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
