//! Single-file upload into a folder.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::folder::Folder;
use super::metadata::{FileRecord, FileRepository, NewFile};
use super::storage::FileStorage;
use super::MAX_FILENAME_LENGTH;
use crate::{FieldTypeError, Result};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename.
    pub name: String,
    /// Client-supplied content type, if any.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create a new UploadedFile.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Stores uploaded files and records their metadata.
#[derive(Debug, Clone)]
pub struct FileUploader {
    storage: FileStorage,
    max_file_size: u64,
}

impl FileUploader {
    /// Create a new FileUploader.
    pub fn new(storage: FileStorage, max_file_size: u64) -> Self {
        Self {
            storage,
            max_file_size,
        }
    }

    /// Get the underlying storage.
    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Largest accepted file in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upload `file` into `folder`.
    ///
    /// Returns `None` when the upload is rejected or fails; the cause is
    /// logged.
    pub async fn upload(
        &self,
        pool: &SqlitePool,
        file: &UploadedFile,
        folder: &Folder,
    ) -> Option<FileRecord> {
        match self.try_upload(pool, file, folder).await {
            Ok(record) => {
                info!(
                    file_id = record.id,
                    folder = %folder.slug,
                    size = record.size,
                    "File uploaded: {}",
                    record.name
                );
                Some(record)
            }
            Err(e) => {
                warn!(folder = %folder.slug, name = %file.name, "Upload rejected: {}", e);
                None
            }
        }
    }

    async fn try_upload(
        &self,
        pool: &SqlitePool,
        file: &UploadedFile,
        folder: &Folder,
    ) -> Result<FileRecord> {
        let name = file.name.trim();
        if name.is_empty() {
            return Err(FieldTypeError::Validation("filename is empty".to_string()));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FieldTypeError::Validation(format!(
                "filename exceeds {MAX_FILENAME_LENGTH} characters"
            )));
        }

        let extension = super::extension_of(name);
        if !folder.allowed_types.permits(&extension) {
            return Err(FieldTypeError::Validation(format!(
                "file type '{extension}' is not allowed in folder {}",
                folder.slug
            )));
        }

        if file.bytes.len() as u64 > self.max_file_size {
            return Err(FieldTypeError::Validation(format!(
                "file is larger than {} bytes",
                self.max_file_size
            )));
        }

        let stored_name = self.storage.save(&file.bytes, name).await?;

        let mut new_file = NewFile::new(folder.id, name, &stored_name, file.bytes.len() as i64);
        if let Some(content_type) = file.content_type.as_deref().filter(|t| !t.is_empty()) {
            new_file = new_file.with_mime_type(content_type);
        }

        match FileRepository::new(pool).create(&new_file).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&stored_name).await {
                    warn!("Failed to remove orphaned blob {}: {}", stored_name, cleanup);
                }
                Err(e)
            }
        }
    }
}
