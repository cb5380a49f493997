//! On-disk blob storage for uploaded files.
//!
//! Files are stored in a sharded directory structure:
//! ```text
//! {base_path}/
//! ├── ab/
//! │   └── ab12cd34-5678-90ab-cdef-123456789012.png
//! └── cd/
//!     └── cd90ab12-3456-7890-abcd-ef1234567890.pdf
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{FieldTypeError, Result};

/// Async file store keyed by generated names.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage rooted at `base_path`, creating it if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a freshly generated name and return that name.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::generate_stored_name(original_name);
        let file_path = self.get_file_path(&stored_name);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file_path, content).await?;

        Ok(stored_name)
    }

    /// Load content from storage.
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        match fs::read(self.get_file_path(stored_name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FieldTypeError::NotFound(format!("stored file {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file. Returns `false` if it didn't exist.
    pub async fn delete(&self, stored_name: &str) -> Result<bool> {
        match fs::remove_file(self.get_file_path(stored_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists in storage.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.get_file_path(stored_name).exists()
    }

    /// Full path: `{base_path}/{shard}/{stored_name}`.
    pub fn get_file_path(&self, stored_name: &str) -> PathBuf {
        self.base_path
            .join(Self::get_shard(stored_name))
            .join(stored_name)
    }

    fn get_shard(stored_name: &str) -> &str {
        stored_name.get(..2).unwrap_or(stored_name)
    }

    /// Generate `{uuid}.{ext}`; `bin` when the name has no extension.
    pub fn generate_stored_name(original_name: &str) -> String {
        let ext = super::extension_of(original_name);
        let ext = if ext.is_empty() { "bin".to_string() } else { ext };
        format!("{}.{ext}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("uploads");

        let storage = FileStorage::new(&storage_path).unwrap();

        assert!(storage_path.is_dir());
        assert_eq!(storage.base_path(), storage_path);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp_dir, storage) = setup_storage();

        let stored_name = storage.save(b"%PDF-1.4", "Report.PDF").await.unwrap();
        assert!(stored_name.ends_with(".pdf"));

        let shard_dir = storage.base_path().join(&stored_name[..2]);
        assert!(shard_dir.is_dir());

        assert_eq!(storage.load(&stored_name).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let (_temp_dir, storage) = setup_storage();
        let result = storage.load("missing.png").await;
        assert!(matches!(result, Err(FieldTypeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        let stored_name = storage.save(b"bytes", "a.png").await.unwrap();
        assert!(storage.exists(&stored_name));

        assert!(storage.delete(&stored_name).await.unwrap());
        assert!(!storage.exists(&stored_name));
        assert!(!storage.delete(&stored_name).await.unwrap());
    }

    #[test]
    fn test_get_file_path() {
        let (_temp_dir, storage) = setup_storage();
        let stored_name = "ab12cd34-5678-90ab-cdef-123456789012.png";

        assert_eq!(
            storage.get_file_path(stored_name),
            storage.base_path().join("ab").join(stored_name)
        );
        assert_eq!(FileStorage::get_shard("x"), "x");
    }

    #[test]
    fn test_generate_stored_name() {
        let a = FileStorage::generate_stored_name("photo.JPG");
        let b = FileStorage::generate_stored_name("photo.JPG");

        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(FileStorage::generate_stored_name("LICENSE").ends_with(".bin"));
    }
}
