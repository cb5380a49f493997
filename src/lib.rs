//! Files field type
//!
//! A content-entry field that holds an ordered list of uploaded files,
//! together with the admin upload controller used to pick and upload them.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod field;
pub mod file;
pub mod logging;
pub mod template;
pub mod web;

pub use cache::{ConfigCache, MemoryConfigCache};
pub use config::Config;
pub use db::Database;
pub use error::{FieldTypeError, Result};
pub use field::{FieldConfig, FilesFieldType};

/// Path prefix of the upload controller routes.
pub const ROUTE_PREFIX: &str = "/streams/files-field_type";
