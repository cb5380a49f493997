//! The files field type.

use std::sync::Arc;

use md5::{Digest, Md5};
use sqlx::SqlitePool;
use tracing::debug;

use super::config::FieldConfig;
use super::entry::Entry;
use super::form::FormContext;
use super::registry::{FileLike, RelatedModelRegistry};
use super::relation::{BelongsToMany, PivotTable};
use super::{ConfigProvider, FieldDescriptor, RuleProvider, SaveHook};
use crate::cache::{cache_key, ConfigCache, CONFIG_TTL_SECS};
use crate::file::ValueTableBuilder;
use crate::template::{TemplateContext, Views, INPUT};
use crate::{FieldTypeError, Result, ROUTE_PREFIX};

/// Field type attaching an ordered list of files to an entry.
///
/// The field has no column of its own; its value lives in the
/// `{entry_table}_{field}` pivot table.
pub struct FilesFieldType {
    field: String,
    config: FieldConfig,
    rules: Vec<String>,
    cache: Arc<dyn ConfigCache>,
    registry: Arc<RelatedModelRegistry>,
    config_ttl_secs: u64,
}

impl FilesFieldType {
    /// Create the field type for `field` with the given options.
    pub fn new(field: impl Into<String>, config: FieldConfig, cache: Arc<dyn ConfigCache>) -> Self {
        Self {
            field: field.into(),
            config,
            rules: Vec::new(),
            cache,
            registry: Arc::new(RelatedModelRegistry::new()),
            config_ttl_secs: CONFIG_TTL_SECS,
        }
    }

    /// Set the base validation rules.
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = rules.into_iter().map(Into::into).collect();
        self
    }

    /// Use a custom related model registry.
    pub fn with_registry(mut self, registry: Arc<RelatedModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set how long cached configurations live.
    pub fn with_config_ttl(mut self, secs: u64) -> Self {
        self.config_ttl_secs = secs;
        self
    }

    /// Pivot table name for `entry`: `{table}_{field}`.
    pub fn pivot_table_name(&self, entry: &dyn Entry) -> String {
        format!("{}_{}", entry.table_name(), self.field)
    }

    /// The model named by the `related` option, or the built-in file model.
    pub fn related_model(&self) -> Result<Arc<dyn FileLike>> {
        self.registry.resolve(self.config.related())
    }

    /// The relation from `entry` to its files, ordered by `sort_order`.
    pub fn relation(&self, entry: &dyn Entry) -> Result<BelongsToMany> {
        let entry_id = entry.id().ok_or_else(|| {
            FieldTypeError::Relation(format!(
                "entry in '{}' has no id; save it before reading '{}'",
                entry.table_name(),
                self.field
            ))
        })?;

        let pivot = PivotTable::new(self.pivot_table_name(entry))?;
        BelongsToMany::new(self.related_model()?, pivot, entry_id)
    }

    /// Split the submitted value on commas.
    ///
    /// Falls back to `default`, then to `""`. An empty value yields `[""]`.
    pub fn post_value(&self, form: &FormContext<'_>, default: Option<&str>) -> Vec<String> {
        let raw = form.value(&self.field).or(default).unwrap_or("");
        raw.split(',').map(str::to_string).collect()
    }

    /// Cache the configuration under its content hash and return the hash.
    ///
    /// Each call rewrites the entry and restarts its expiry.
    pub fn config_key(&self) -> Result<String> {
        let config = self.config().to_json();
        let json = serde_json::to_string(&config)?;
        let key = format!("{:x}", Md5::digest(json.as_bytes()));

        self.cache.put(&cache_key(&key), config, self.config_ttl_secs);
        debug!(field = %self.field, key = %key, "Field config cached");

        Ok(key)
    }

    /// Check a submitted id list against the `min`/`max` options.
    ///
    /// Empty tokens are not counted. A bound that is not a whole number is
    /// a validation error, since `rules()` would emit it unchanged.
    pub fn validate(&self, values: &[String]) -> Result<()> {
        let count = values.iter().filter(|v| !v.trim().is_empty()).count();

        if let Some(min) = self.bound("min", self.config.min())? {
            if count < min {
                return Err(FieldTypeError::Validation(format!(
                    "{} requires at least {min} files",
                    self.field
                )));
            }
        }

        if let Some(max) = self.bound("max", self.config.max())? {
            if count > max {
                return Err(FieldTypeError::Validation(format!(
                    "{} accepts at most {max} files",
                    self.field
                )));
            }
        }

        Ok(())
    }

    fn bound(&self, option: &str, operand: Option<String>) -> Result<Option<usize>> {
        operand
            .map(|value| {
                value.trim().parse::<usize>().map_err(|_| {
                    FieldTypeError::Validation(format!(
                        "{} has an invalid {option} option '{value}'",
                        self.field
                    ))
                })
            })
            .transpose()
    }

    /// Render the table of files currently attached to `entry`.
    ///
    /// Unsaved entries have no files.
    pub async fn value_table(
        &self,
        pool: &SqlitePool,
        views: &Views,
        entry: &dyn Entry,
    ) -> Result<String> {
        let files = match entry.id() {
            Some(_) => self.relation(entry)?.get(pool).await?,
            None => Vec::new(),
        };

        ValueTableBuilder::new(files).build().render(views)
    }

    /// Render the form input around a pre-rendered value table.
    pub fn render_input(&self, views: &Views, value_table: &str) -> Result<String> {
        let key = self.config_key()?;

        let mut context = TemplateContext::new();
        context.set("field", self.field.as_str());
        context.set("folders_url", format!("{ROUTE_PREFIX}/index/{key}"));
        context.set("key", key);
        context.set("value_table", value_table);

        Ok(views.render(INPUT, &context)?)
    }
}

impl RuleProvider for FilesFieldType {
    fn rules(&self) -> Vec<String> {
        let mut rules = self.rules.clone();

        if let Some(min) = self.config.min() {
            rules.push(format!("min:{min}"));
        }
        if let Some(max) = self.config.max() {
            rules.push(format!("max:{max}"));
        }

        rules
    }
}

impl ConfigProvider for FilesFieldType {
    fn config(&self) -> FieldConfig {
        self.config.normalized()
    }
}

impl SaveHook for FilesFieldType {
    fn handle(&self, form: &mut FormContext<'_>) {
        let ids = self.post_value(form, None);
        form.entry_mut().set_relation_value(&self.field, ids);
    }
}

impl FieldDescriptor for FilesFieldType {
    fn field(&self) -> &str {
        &self.field
    }
}
