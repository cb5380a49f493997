//! Upload controller handlers.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::file::{
    parse_uploaded, resolve_allowed_types, FolderRepository, UploadTableBuilder, UploadedFile,
};
use crate::template::{TemplateContext, UPLOAD_INDEX};
use crate::web::dto::{
    FileResponse, MessageResponse, RecentQuery, UploadForm, UploadIndexQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AdminUser;
use crate::{FieldTypeError, ROUTE_PREFIX};

/// GET /streams/files-field_type/upload/:folder - Browse a folder and upload into it.
#[utoipa::path(
    get,
    path = "/streams/files-field_type/upload/{folder}",
    tag = "upload",
    params(
        ("folder" = String, Path, description = "Folder ID or slug"),
        UploadIndexQuery
    ),
    responses(
        (status = 200, description = "Upload view", content_type = "text/html", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Path(folder): Path<String>,
    Query(query): Query<UploadIndexQuery>,
) -> Result<Html<String>, ApiError> {
    let folder = FolderRepository::new(state.db.pool())
        .find_by_identifier(&folder)
        .await?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;

    let config = state.field_config(&query.key);
    let allowed = resolve_allowed_types(&config.allowed_types(), &folder.allowed_types);
    let accept = allowed
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    let table = UploadTableBuilder::new()
        .build(state.db.pool())
        .await?
        .render(&state.views)?;

    let folder_json = serde_json::to_value(&folder).map_err(FieldTypeError::from)?;

    let mut context = TemplateContext::new();
    context.set("folder", folder_json);
    context.set("config", config.to_json());
    context.set("allowed", allowed);
    context.set("accept", accept);
    context.set("key", query.key.as_str());
    context.set("upload_url", format!("{ROUTE_PREFIX}/handle"));
    context.set("recent_url", format!("{ROUTE_PREFIX}/recent"));
    context.set("table", table);

    let html = state
        .views
        .render(UPLOAD_INDEX, &context)
        .map_err(FieldTypeError::from)?;
    Ok(Html(html))
}

/// POST /streams/files-field_type/handle - Upload a file into a folder.
#[utoipa::path(
    post,
    path = "/streams/files-field_type/handle",
    tag = "upload",
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Fields `upload` (file) and `folder` (folder ID)"
    ),
    responses(
        (status = 200, description = "File uploaded", body = FileResponse),
        (status = 400, description = "Malformed multipart body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required"),
        (status = 500, description = "Upload failed", body = MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (file, folder_id) = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(user = %claims.username, "Upload rejected: {}", e.body_text());
            return Ok(upload_failed());
        }
        Err(e) => {
            tracing::debug!("Multipart error: {}", e);
            return Err(ApiError::bad_request("Invalid multipart data"));
        }
    };

    let folder = match folder_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => FolderRepository::new(state.db.pool()).find_by_identifier(id).await?,
        None => None,
    };

    let record = match (&file, &folder) {
        (Some(file), Some(folder)) => state.uploader.upload(state.db.pool(), file, folder).await,
        _ => {
            tracing::warn!(
                user = %claims.username,
                has_file = file.is_some(),
                folder = ?folder_id,
                "Upload request missing file or folder"
            );
            None
        }
    };

    Ok(match record {
        Some(record) => (StatusCode::OK, Json(FileResponse::from(record))).into_response(),
        None => upload_failed(),
    })
}

/// Read the `upload` file and `folder` id fields. Other fields are ignored.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, Option<String>), MultipartError> {
    let mut file = None;
    let mut folder_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("upload") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                let mut uploaded = UploadedFile::new(name, bytes.to_vec());
                if let Some(content_type) = content_type {
                    uploaded = uploaded.with_content_type(content_type);
                }
                file = Some(uploaded);
            }
            Some("folder") => {
                folder_id = Some(field.text().await?.trim().to_string());
            }
            _ => {}
        }
    }

    Ok((file, folder_id))
}

fn upload_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::upload_failed()),
    )
        .into_response()
}

/// GET /streams/files-field_type/recent - Table of files uploaded in this session.
#[utoipa::path(
    get,
    path = "/streams/files-field_type/recent",
    tag = "upload",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent uploads table", content_type = "text/html", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn recent(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Query(query): Query<RecentQuery>,
) -> Result<Html<String>, ApiError> {
    let table = UploadTableBuilder::new()
        .uploaded(parse_uploaded(&query.uploaded))
        .build(state.db.pool())
        .await?
        .render(&state.views)?;

    Ok(Html(table))
}
