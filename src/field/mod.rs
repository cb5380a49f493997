//! Field type capabilities and the files field type.
//!
//! A field type is composed of three capabilities:
//! - [`RuleProvider`]: validation rules for the submitted value
//! - [`ConfigProvider`]: the field's normalized options
//! - [`SaveHook`]: writes the submitted value onto the entry
//!
//! [`FilesFieldType`] implements all three and relates entries to files
//! through an ordered pivot table.

mod config;
mod entry;
mod files;
mod form;
mod registry;
mod relation;

pub use config::{is_truthy, FieldConfig};
pub use entry::{Entry, EntryRecord};
pub use files::FilesFieldType;
pub use form::FormContext;
pub use registry::{FileLike, FileModel, RelatedModelRegistry};
pub use relation::{BelongsToMany, PivotTable, FOREIGN_PIVOT_KEY, RELATED_PIVOT_KEY, SORT_COLUMN};

/// Supplies validation rules.
pub trait RuleProvider {
    /// Rule directives such as `required` or `min:2`.
    fn rules(&self) -> Vec<String>;
}

/// Supplies the field's options.
pub trait ConfigProvider {
    /// Options with defaults and normalization applied.
    fn config(&self) -> FieldConfig;
}

/// Handles saving the field's submitted value.
pub trait SaveHook {
    /// Write the submitted value onto the form's entry.
    fn handle(&self, form: &mut FormContext<'_>);
}

/// A complete field type.
pub trait FieldDescriptor: RuleProvider + ConfigProvider + SaveHook {
    /// Field name (slug).
    fn field(&self) -> &str;
}
