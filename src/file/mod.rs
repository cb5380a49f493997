//! File management module.
//!
//! This module provides the collaborators behind the upload controller:
//! - Folders with allowed file types
//! - File metadata records
//! - Sharded on-disk storage with UUID naming
//! - Single-file uploads
//! - HTML tables of files

mod folder;
mod metadata;
mod storage;
mod table;
mod uploader;

pub use folder::{resolve_allowed_types, AllowedTypes, Folder, FolderRepository, NewFolder};
pub use metadata::{FileRecord, FileRepository, NewFile};
pub use storage::FileStorage;
pub use table::{parse_uploaded, FileTable, UploadTableBuilder, ValueTableBuilder};
pub use uploader::{FileUploader, UploadedFile};

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Lower-cased extension of a filename, without the dot. Empty if none.
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}
