//! Ordered many-to-many relation between entries and files.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;

use super::registry::FileLike;
use crate::file::FileRecord;
use crate::{FieldTypeError, Result};

/// Pivot column referencing the entry.
pub const FOREIGN_PIVOT_KEY: &str = "entry_id";
/// Pivot column referencing the related file.
pub const RELATED_PIVOT_KEY: &str = "file_id";
/// Pivot column holding display order.
pub const SORT_COLUMN: &str = "sort_order";

fn validate_identifier(name: &str) -> Result<()> {
    let starts_with_digit = name.starts_with(|c: char| c.is_ascii_digit());
    if name.is_empty()
        || starts_with_digit
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FieldTypeError::Validation(format!(
            "'{name}' is not a valid table name"
        )));
    }
    Ok(())
}

/// A `{entry_table}_{field}` pivot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    name: String,
}

impl PivotTable {
    /// Create a handle for the named pivot table.
    ///
    /// The name is interpolated into SQL and must match `[A-Za-z0-9_]+`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self { name })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the table and its index if they don't exist.
    pub async fn create(&self, pool: &SqlitePool) -> Result<()> {
        let name = &self.name;
        sqlx::raw_sql(&format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                {FOREIGN_PIVOT_KEY} INTEGER NOT NULL,
                {RELATED_PIVOT_KEY} INTEGER NOT NULL,
                {SORT_COLUMN}       INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_{name}_{FOREIGN_PIVOT_KEY}
                ON {name}({FOREIGN_PIVOT_KEY}, {SORT_COLUMN});"
        ))
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Replace the entry's rows with `ids`, in order.
    ///
    /// Empty and non-numeric tokens are skipped; `sort_order` is the position
    /// among the kept ids. Returns the stored ids.
    pub async fn sync<S: AsRef<str>>(
        &self,
        pool: &SqlitePool,
        entry_id: i64,
        ids: &[S],
    ) -> Result<Vec<i64>> {
        let file_ids: Vec<i64> = ids
            .iter()
            .filter_map(|id| id.as_ref().trim().parse().ok())
            .collect();

        let name = &self.name;
        let mut tx = pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {name} WHERE {FOREIGN_PIVOT_KEY} = ?"))
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO {name} ({FOREIGN_PIVOT_KEY}, {RELATED_PIVOT_KEY}, {SORT_COLUMN}) VALUES (?, ?, ?)"
        );
        for (position, file_id) in file_ids.iter().enumerate() {
            sqlx::query(&insert)
                .bind(entry_id)
                .bind(*file_id)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(pivot = %name, entry_id, count = file_ids.len(), "Pivot synced");

        Ok(file_ids)
    }

    /// File ids attached to the entry, in display order.
    pub async fn file_ids(&self, pool: &SqlitePool, entry_id: i64) -> Result<Vec<i64>> {
        let name = &self.name;
        let rows: Vec<(i64,)> = sqlx::query_as(&format!(
            "SELECT {RELATED_PIVOT_KEY} FROM {name}
             WHERE {FOREIGN_PIVOT_KEY} = ? ORDER BY {SORT_COLUMN} ASC, rowid ASC"
        ))
        .bind(entry_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

/// Files related to one entry through a pivot table, ordered by `sort_order`.
#[derive(Debug, Clone)]
pub struct BelongsToMany {
    related: Arc<dyn FileLike>,
    pivot: PivotTable,
    entry_id: i64,
}

impl BelongsToMany {
    /// Create the relation for a persisted entry.
    pub fn new(related: Arc<dyn FileLike>, pivot: PivotTable, entry_id: i64) -> Result<Self> {
        validate_identifier(related.table())?;
        Ok(Self {
            related,
            pivot,
            entry_id,
        })
    }

    /// The related model.
    pub fn related(&self) -> &Arc<dyn FileLike> {
        &self.related
    }

    /// The pivot table.
    pub fn pivot(&self) -> &PivotTable {
        &self.pivot
    }

    /// The owning entry's id.
    pub fn entry_id(&self) -> i64 {
        self.entry_id
    }

    /// Query selecting the related records. Binds one parameter: the entry id.
    pub fn to_sql(&self) -> String {
        let related = self.related.table();
        let pivot = self.pivot.name();
        format!(
            "SELECT {related}.id, {related}.folder_id, {related}.name, {related}.stored_name, \
             {related}.extension, {related}.mime_type, {related}.size, {related}.created_at \
             FROM {related} \
             INNER JOIN {pivot} ON {pivot}.{RELATED_PIVOT_KEY} = {related}.id \
             WHERE {pivot}.{FOREIGN_PIVOT_KEY} = ? \
             ORDER BY {pivot}.{SORT_COLUMN} ASC"
        )
    }

    /// Load the related records in display order.
    pub async fn get(&self, pool: &SqlitePool) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&self.to_sql())
            .bind(self.entry_id)
            .fetch_all(pool)
            .await?;

        Ok(files)
    }

    /// Related ids in display order.
    pub async fn ids(&self, pool: &SqlitePool) -> Result<Vec<i64>> {
        self.pivot.file_ids(pool, self.entry_id).await
    }

    /// Replace the related ids.
    pub async fn sync<S: AsRef<str>>(&self, pool: &SqlitePool, ids: &[S]) -> Result<Vec<i64>> {
        self.pivot.sync(pool, self.entry_id, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FileModel;
    use crate::file::{FileRepository, FolderRepository, NewFile, NewFolder};
    use crate::Database;

    #[test]
    fn test_pivot_name_validation() {
        assert!(PivotTable::new("posts_gallery").is_ok());
        assert!(PivotTable::new("").is_err());
        assert!(matches!(
            PivotTable::new("posts; DROP TABLE files"),
            Err(FieldTypeError::Validation(_))
        ));
        assert!(PivotTable::new("posts-gallery").is_err());
        assert!(matches!(
            PivotTable::new("2024posts_gallery"),
            Err(FieldTypeError::Validation(_))
        ));
        assert!(PivotTable::new("posts2024_gallery").is_ok());
    }

    #[tokio::test]
    async fn test_save_relations_rejects_numeric_table() {
        use crate::field::{Entry, EntryRecord};

        let db = Database::open_in_memory().await.unwrap();
        let mut entry = EntryRecord::new("2024posts").with_id(1);
        entry.set_relation_value("gallery", vec!["1".to_string()]);

        let err = entry.save_relations(db.pool()).await.unwrap_err();
        assert!(matches!(err, FieldTypeError::Validation(_)));
    }

    #[test]
    fn test_to_sql_orders_by_sort_order() {
        let relation = BelongsToMany::new(
            Arc::new(FileModel),
            PivotTable::new("posts_gallery").unwrap(),
            1,
        )
        .unwrap();

        let sql = relation.to_sql();
        assert!(sql.contains("INNER JOIN posts_gallery ON posts_gallery.file_id = files.id"));
        assert!(sql.contains("WHERE posts_gallery.entry_id = ?"));
        assert!(sql.ends_with("ORDER BY posts_gallery.sort_order ASC"));
    }

    #[tokio::test]
    async fn test_sync_skips_empty_tokens() {
        let db = Database::open_in_memory().await.unwrap();
        let pivot = PivotTable::new("posts_gallery").unwrap();
        pivot.create(db.pool()).await.unwrap();
        pivot.create(db.pool()).await.unwrap();

        let stored = pivot.sync(db.pool(), 7, &["3", "", "1", "x", "2"]).await.unwrap();
        assert_eq!(stored, vec![3, 1, 2]);
        assert_eq!(pivot.file_ids(db.pool(), 7).await.unwrap(), vec![3, 1, 2]);

        pivot.sync(db.pool(), 7, &[""]).await.unwrap();
        assert!(pivot.file_ids(db.pool(), 7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relation_get_in_sort_order() {
        let db = Database::open_in_memory().await.unwrap();
        let folder = FolderRepository::new(db.pool())
            .create(&NewFolder::new("images", "Images"))
            .await
            .unwrap();
        let repo = FileRepository::new(db.pool());
        let a = repo
            .create(&NewFile::new(folder.id, "a.png", "a.png", 1))
            .await
            .unwrap();
        let b = repo
            .create(&NewFile::new(folder.id, "b.png", "b.png", 1))
            .await
            .unwrap();

        let pivot = PivotTable::new("posts_gallery").unwrap();
        pivot.create(db.pool()).await.unwrap();
        let relation = BelongsToMany::new(Arc::new(FileModel), pivot, 1).unwrap();

        relation
            .sync(db.pool(), &[b.id.to_string(), a.id.to_string()])
            .await
            .unwrap();

        let names: Vec<String> = relation
            .get(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["b.png", "a.png"]);
        assert_eq!(relation.ids(db.pool()).await.unwrap(), vec![b.id, a.id]);
    }
}
