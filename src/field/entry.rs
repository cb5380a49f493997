//! Content entries that own file relations.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::info;

use super::relation::PivotTable;
use crate::{FieldTypeError, Result};

/// A content record a files field can be attached to.
pub trait Entry: Send + Sync {
    /// Table the entry is stored in.
    fn table_name(&self) -> &str;

    /// Persisted id, if the entry has been saved.
    fn id(&self) -> Option<i64>;

    /// Record the ids submitted for a relation field.
    fn set_relation_value(&mut self, field: &str, ids: Vec<String>);
}

/// Generic entry that holds pending relation values until saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRecord {
    table: String,
    id: Option<i64>,
    relations: BTreeMap<String, Vec<String>>,
}

impl EntryRecord {
    /// Create an unsaved entry in `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id: None,
            relations: BTreeMap::new(),
        }
    }

    /// Set the persisted id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Pending value for a relation field.
    pub fn relation_value(&self, field: &str) -> Option<&[String]> {
        self.relations.get(field).map(Vec::as_slice)
    }

    /// Check if any relation values are waiting to be saved.
    pub fn has_pending_relations(&self) -> bool {
        !self.relations.is_empty()
    }

    /// Write every pending relation value into its pivot table.
    ///
    /// Pivot tables are created on first use. Pending values are cleared
    /// once all of them are stored.
    pub async fn save_relations(&mut self, pool: &SqlitePool) -> Result<()> {
        if self.relations.is_empty() {
            return Ok(());
        }

        let entry_id = self.id.ok_or_else(|| {
            FieldTypeError::Relation(format!(
                "entry in '{}' must be saved before its relations",
                self.table
            ))
        })?;

        for (field, ids) in &self.relations {
            let pivot = PivotTable::new(format!("{}_{}", self.table, field))?;
            pivot.create(pool).await?;
            let stored = pivot.sync(pool, entry_id, ids.as_slice()).await?;
            info!(pivot = pivot.name(), entry_id, files = stored.len(), "Relation saved");
        }

        self.relations.clear();
        Ok(())
    }
}

impl Entry for EntryRecord {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_relation_value(&mut self, field: &str, ids: Vec<String>) {
        self.relations.insert(field.to_string(), ids);
    }
}
