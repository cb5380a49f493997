//! Folder types and repository.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{FieldTypeError, Result};

/// Lower-cased file extensions a folder accepts. Empty means any type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowedTypes(Vec<String>);

impl AllowedTypes {
    /// Build from any list of extensions; entries are trimmed, lower-cased,
    /// stripped of a leading dot and de-duplicated.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for t in types {
            let t = t.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !t.is_empty() && !normalized.contains(&t) {
                normalized.push(t);
            }
        }
        Self(normalized)
    }

    /// Get the extensions.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Check if no restriction is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the extension is accepted.
    pub fn permits(&self, extension: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|t| t.eq_ignore_ascii_case(extension))
    }

    /// Storage representation.
    pub fn to_column(&self) -> String {
        self.0.join(",")
    }
}

impl TryFrom<String> for AllowedTypes {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Ok(Self::new(value.split(',')))
    }
}

/// Intersect the types a field allows with the types a folder allows.
///
/// The field's order is kept. When nothing overlaps the folder's full set is
/// returned.
pub fn resolve_allowed_types(configured: &[String], folder: &AllowedTypes) -> Vec<String> {
    let allowed: Vec<String> = configured
        .iter()
        .filter(|t| folder.as_slice().contains(t))
        .cloned()
        .collect();

    if allowed.is_empty() {
        folder.as_slice().to_vec()
    } else {
        allowed
    }
}

/// A folder files are uploaded into.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Folder name.
    pub name: String,
    /// Folder description.
    pub description: Option<String>,
    /// Accepted file extensions.
    #[sqlx(try_from = "String")]
    pub allowed_types: AllowedTypes,
    /// When the folder was created.
    pub created_at: String,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// URL-safe unique identifier.
    pub slug: String,
    /// Folder name.
    pub name: String,
    /// Folder description.
    pub description: Option<String>,
    /// Accepted file extensions.
    pub allowed_types: AllowedTypes,
}

impl NewFolder {
    /// Create a new folder accepting any file type.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            allowed_types: AllowedTypes::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict accepted file extensions.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_types = AllowedTypes::new(types);
        self
    }
}

const FOLDER_COLUMNS: &str = "id, slug, name, description, allowed_types, created_at";

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let result = sqlx::query(
            "INSERT INTO folders (slug, name, description, allowed_types) VALUES (?, ?, ?, ?)",
        )
        .bind(&folder.slug)
        .bind(&folder.name)
        .bind(&folder.description)
        .bind(folder.allowed_types.to_column())
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FieldTypeError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(folder)
    }

    /// Get a folder by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(folder)
    }

    /// Get a folder by ID (numeric identifier) or slug.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Folder>> {
        let identifier = identifier.trim();
        match identifier.parse::<i64>() {
            Ok(id) => self.get_by_id(id).await,
            Err(_) => self.get_by_slug(identifier).await,
        }
    }

    /// List all folders ordered by name.
    pub async fn list(&self) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(folders)
    }

    /// List the folders matching any of the identifiers, in identifier order.
    ///
    /// Unknown identifiers are skipped.
    pub async fn list_by_identifiers(&self, identifiers: &[String]) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = Vec::new();
        for identifier in identifiers {
            if let Some(folder) = self.find_by_identifier(identifier).await? {
                if !folders.iter().any(|f| f.id == folder.id) {
                    folders.push(folder);
                }
            }
        }
        Ok(folders)
    }

    /// Delete a folder by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
