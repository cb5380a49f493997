//! HTML tables of files.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use super::metadata::{FileRecord, FileRepository};
use crate::template::{TemplateContext, Value, Views, UPLOAD_TABLE};
use crate::Result;

/// Split a comma-separated id list, dropping empty tokens.
pub fn parse_uploaded(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn format_timestamp(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// A rendered-on-demand table of files.
#[derive(Debug, Clone)]
pub struct FileTable {
    rows: Vec<FileRecord>,
    empty_message: String,
}

impl FileTable {
    /// Files in display order.
    pub fn rows(&self) -> &[FileRecord] {
        &self.rows
    }

    /// Render the table HTML.
    pub fn render(&self, views: &Views) -> Result<String> {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|file| {
                let mut row: HashMap<String, Value> = match Value::from(file.attributes()) {
                    Value::Object(map) => map,
                    _ => HashMap::new(),
                };
                row.insert("readable_size".to_string(), file.readable_size().into());
                row.insert(
                    "uploaded_at".to_string(),
                    format_timestamp(&file.created_at).into(),
                );
                Value::object(row)
            })
            .collect();

        let mut context = TemplateContext::new();
        context.set("rows", Value::list(rows));
        context.set("empty_message", self.empty_message.as_str());

        Ok(views.render(UPLOAD_TABLE, &context)?)
    }
}

/// Builds the table of files uploaded during the current browsing session.
#[derive(Debug, Clone, Default)]
pub struct UploadTableBuilder {
    uploaded: Vec<String>,
}

impl UploadTableBuilder {
    /// Create a builder with no uploaded files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the uploaded file ids.
    pub fn uploaded(mut self, ids: Vec<String>) -> Self {
        self.uploaded = ids;
        self
    }

    /// The ids the table is restricted to.
    pub fn uploaded_ids(&self) -> &[String] {
        &self.uploaded
    }

    /// Load the uploaded files, newest first.
    pub async fn build(&self, pool: &SqlitePool) -> Result<FileTable> {
        let rows = if self.uploaded.is_empty() {
            Vec::new()
        } else {
            FileRepository::new(pool).find_many(&self.uploaded).await?
        };

        Ok(FileTable {
            rows,
            empty_message: "No files have been uploaded yet.".to_string(),
        })
    }
}

/// Builds the read-only table of files currently attached to an entry.
#[derive(Debug, Clone, Default)]
pub struct ValueTableBuilder {
    files: Vec<FileRecord>,
}

impl ValueTableBuilder {
    /// Create a builder from the attached files in relation order.
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self { files }
    }

    /// Build the table. Duplicate files keep their first position.
    pub fn build(self) -> FileTable {
        let mut rows: Vec<FileRecord> = Vec::with_capacity(self.files.len());
        for file in self.files {
            if !rows.iter().any(|r| r.id == file.id) {
                rows.push(file);
            }
        }

        FileTable {
            rows,
            empty_message: "No files selected.".to_string(),
        }
    }
}
