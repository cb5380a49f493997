//! Request and response types for the upload controller.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::file::FileRecord;

/// Message returned when an upload produces no file.
pub const UPLOAD_FAILED_MESSAGE: &str = "There was a problem uploading the file.";

/// Query parameters of the upload index.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadIndexQuery {
    /// Field config cache key.
    #[serde(default)]
    pub key: String,
}

/// Query parameters of the recent uploads table.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Comma separated ids of files uploaded in this session.
    #[serde(default)]
    pub uploaded: String,
}

/// Multipart body of an upload.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// The file.
    #[schema(value_type = String, format = Binary)]
    pub upload: Vec<u8>,
    /// ID of the target folder.
    pub folder: i64,
}

/// Plain message body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Body of a failed upload.
    pub fn upload_failed() -> Self {
        Self::new(UPLOAD_FAILED_MESSAGE)
    }
}

/// Attributes of an uploaded file.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    /// File ID.
    pub id: i64,
    /// Folder ID.
    pub folder_id: i64,
    /// Original filename.
    pub name: String,
    /// Stored filename.
    pub stored_name: String,
    /// Lower-cased extension.
    pub extension: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Upload timestamp.
    pub created_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            folder_id: file.folder_id,
            name: file.name,
            stored_name: file.stored_name,
            extension: file.extension,
            mime_type: file.mime_type,
            size: file.size,
            created_at: file.created_at,
        }
    }
}
