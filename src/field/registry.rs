//! Related model resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{FieldTypeError, Result};

/// A model a files field can relate entries to.
///
/// The model's table must carry the file columns (`id`, `folder_id`,
/// `name`, `stored_name`, `extension`, `mime_type`, `size`, `created_at`).
pub trait FileLike: Send + Sync + fmt::Debug {
    /// Identifier used in the `related` config option.
    fn identifier(&self) -> &str;

    /// Table holding the related records.
    fn table(&self) -> &str;
}

/// The built-in file model backed by the `files` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileModel;

impl FileModel {
    /// Identifier of the built-in model.
    pub const IDENTIFIER: &'static str = "file";
}

impl FileLike for FileModel {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn table(&self) -> &str {
        "files"
    }
}

/// Maps `related` identifiers to models.
#[derive(Debug, Clone)]
pub struct RelatedModelRegistry {
    models: HashMap<String, Arc<dyn FileLike>>,
}

impl Default for RelatedModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RelatedModelRegistry {
    /// Create a registry holding the built-in [`FileModel`].
    pub fn new() -> Self {
        let mut models: HashMap<String, Arc<dyn FileLike>> = HashMap::new();
        models.insert(FileModel::IDENTIFIER.to_string(), Arc::new(FileModel));
        Self { models }
    }

    /// Register a model under its identifier, replacing any previous one.
    pub fn register(mut self, model: Arc<dyn FileLike>) -> Self {
        self.models.insert(model.identifier().to_string(), model);
        self
    }

    /// Resolve an identifier. `None` resolves to the built-in [`FileModel`].
    pub fn resolve(&self, identifier: Option<&str>) -> Result<Arc<dyn FileLike>> {
        let identifier = identifier.unwrap_or(FileModel::IDENTIFIER);
        self.models.get(identifier).cloned().ok_or_else(|| {
            FieldTypeError::Config(format!("unknown related model '{identifier}'"))
        })
    }
}
