//! HTTP handlers for the upload controller.

pub mod folders;
pub mod upload;

use std::sync::Arc;

use crate::cache::{cache_key, ConfigCache, CONFIG_TTL_SECS};
use crate::field::{FieldConfig, FilesFieldType};
use crate::file::FileUploader;
use crate::template::Views;
use crate::Database;

pub use folders::*;
pub use upload::*;

/// Shared state of the upload controller.
pub struct AppState {
    /// Database holding folders and file metadata.
    pub db: Arc<Database>,
    /// Field configuration cache shared with the field type.
    pub cache: Arc<dyn ConfigCache>,
    /// Upload pipeline.
    pub uploader: FileUploader,
    /// Compiled views.
    pub views: Arc<Views>,
    /// Lifetime of field configurations cached by field types.
    pub config_ttl_secs: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Arc<Database>,
        cache: Arc<dyn ConfigCache>,
        uploader: FileUploader,
        views: Arc<Views>,
    ) -> Self {
        Self {
            db,
            cache,
            uploader,
            views,
            config_ttl_secs: CONFIG_TTL_SECS,
        }
    }

    /// Set the lifetime of cached field configurations.
    pub fn with_config_ttl(mut self, secs: u64) -> Self {
        self.config_ttl_secs = secs;
        self
    }

    /// A files field bound to this controller's cache.
    ///
    /// Keys rendered by the field resolve on this controller's routes.
    pub fn files_field(&self, field: impl Into<String>, config: FieldConfig) -> FilesFieldType {
        FilesFieldType::new(field, config, self.cache.clone()).with_config_ttl(self.config_ttl_secs)
    }

    /// Field configuration cached under `key`.
    ///
    /// An expired or unknown key yields an empty configuration.
    pub fn field_config(&self, key: &str) -> FieldConfig {
        match self.cache.get(&cache_key(key)) {
            Some(value) => FieldConfig::from_json(value),
            None => {
                tracing::debug!(key = %key, "No cached field config");
                FieldConfig::new()
            }
        }
    }
}
