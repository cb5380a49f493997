//! Folder browser handler.

use axum::{
    extract::{Path, State},
    response::Html,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::file::{Folder, FolderRepository};
use crate::template::{TemplateContext, Value, FOLDERS_INDEX};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AdminUser;
use crate::{FieldTypeError, ROUTE_PREFIX};

/// Link from the folder list to a folder's upload view.
pub fn folder_url(folder: &Folder, key: &str) -> String {
    format!(
        "{ROUTE_PREFIX}/upload/{}?key={}",
        folder.id,
        urlencoding::encode(key)
    )
}

/// GET /streams/files-field_type/index/:key - List the folders a field may upload into.
#[utoipa::path(
    get,
    path = "/streams/files-field_type/index/{key}",
    tag = "upload",
    params(
        ("key" = String, Path, description = "Field config cache key")
    ),
    responses(
        (status = 200, description = "Folder list", content_type = "text/html", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn folders(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Path(key): Path<String>,
) -> Result<Html<String>, ApiError> {
    let config = state.field_config(&key);
    let identifiers = config.folders();

    let repo = FolderRepository::new(state.db.pool());
    let folders = if identifiers.is_empty() {
        repo.list().await?
    } else {
        repo.list_by_identifiers(&identifiers).await?
    };

    tracing::debug!(key = %key, count = folders.len(), "Listing folders");

    let items: Vec<Value> = folders
        .iter()
        .map(|folder| {
            let mut item = HashMap::new();
            item.insert("id".to_string(), Value::number(folder.id));
            item.insert("name".to_string(), Value::string(folder.name.as_str()));
            item.insert(
                "description".to_string(),
                folder
                    .description
                    .as_deref()
                    .map(Value::string)
                    .unwrap_or(Value::Null),
            );
            item.insert("url".to_string(), Value::string(folder_url(folder, &key)));
            Value::object(item)
        })
        .collect();

    let mut context = TemplateContext::new();
    context.set("folders", Value::list(items));
    context.set("key", key.as_str());

    let html = state
        .views
        .render(FOLDERS_INDEX, &context)
        .map_err(FieldTypeError::from)?;
    Ok(Html(html))
}
