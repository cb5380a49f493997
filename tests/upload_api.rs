//! Upload controller integration tests.

mod common;

use std::collections::HashMap;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::{
    admin_bearer, create_folder, create_test_server, member_bearer, token_with, TEST_MAX_FILE_SIZE,
};
use files_field_type::cache::{cache_key, ConfigCache, CONFIG_TTL_SECS};
use files_field_type::field::{EntryRecord, FieldConfig, FilesFieldType, FormContext, SaveHook};
use files_field_type::file::{FileRepository, NewFile};
use files_field_type::template::Views;
use files_field_type::web::middleware::ADMIN_ROLE;

const UPLOAD_FAILED: &str = "There was a problem uploading the file.";

fn upload_form(folder: &str, name: &str, content: &[u8], mime: &str) -> MultipartForm {
    MultipartForm::new().add_text("folder", folder.to_string()).add_part(
        "upload",
        Part::bytes(content.to_vec())
            .file_name(name.to_string())
            .mime_type(mime.to_string()),
    )
}

// ============================================================================
// Upload Index Tests
// ============================================================================

#[tokio::test]
async fn test_index_intersects_allowed_types() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "documents", "Documents", &["jpg", "png", "pdf"]).await;

    ctx.cache.put(
        &cache_key("abc"),
        json!({ "allowed_types": ["png", "pdf", "zip"] }),
        CONFIG_TTL_SECS,
    );

    let response = ctx
        .server
        .get(&format!("/streams/files-field_type/upload/{}", folder.id))
        .add_query_param("key", "abc")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"accept=".png,.pdf""#));
    assert!(html.contains("<span>png</span><span>pdf</span>"));
    assert!(!html.contains("<span>jpg</span>"));
    assert!(html.contains("Documents"));
}

#[tokio::test]
async fn test_index_falls_back_to_folder_types() {
    let ctx = create_test_server().await;
    create_folder(&ctx.db, "images", "Images", &["jpg", "png"]).await;

    ctx.cache.put(
        &cache_key("gifs-only"),
        json!({ "allowed_types": ["gif"] }),
        CONFIG_TTL_SECS,
    );

    let response = ctx
        .server
        .get("/streams/files-field_type/upload/images")
        .add_query_param("key", "gifs-only")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    assert!(response.text().contains(r#"accept=".jpg,.png""#));
}

#[tokio::test]
async fn test_index_with_expired_key_uses_empty_config() {
    let ctx = create_test_server().await;
    create_folder(&ctx.db, "images", "Images", &["jpg", "png"]).await;

    let response = ctx
        .server
        .get("/streams/files-field_type/upload/images")
        .add_query_param("key", "never-cached")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"accept=".jpg,.png""#));
    assert!(html.contains("No files have been uploaded yet."));
}

#[tokio::test]
async fn test_index_unrestricted_folder() {
    let ctx = create_test_server().await;
    create_folder(&ctx.db, "misc", "Misc", &[]).await;

    let response = ctx
        .server
        .get("/streams/files-field_type/upload/misc")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("Any file type is allowed."));
}

#[tokio::test]
async fn test_index_unknown_folder() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/streams/files-field_type/upload/missing")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_success() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "images", "Images", &["png"]).await;

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(upload_form(
            &folder.id.to_string(),
            "logo.png",
            b"\x89PNG fake image",
            "image/png",
        ))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "logo.png");
    assert_eq!(body["folder_id"], folder.id);
    assert_eq!(body["extension"], "png");
    assert_eq!(body["mime_type"], "image/png");
    assert_eq!(body["size"], 15);

    let id = body["id"].as_i64().unwrap();
    let stored = FileRepository::new(ctx.db.pool())
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "logo.png");
}

#[tokio::test]
async fn test_upload_rejected_type() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "images", "Images", &["png"]).await;

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(upload_form(
            &folder.id.to_string(),
            "script.exe",
            b"MZ",
            "application/octet-stream",
        ))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, json!({ "message": UPLOAD_FAILED }));

    let count = FileRepository::new(ctx.db.pool())
        .count_by_folder(folder.id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_upload_oversize() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "images", "Images", &[]).await;
    let content = vec![0u8; TEST_MAX_FILE_SIZE as usize + 1];

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(upload_form(
            &folder.id.to_string(),
            "big.bin",
            &content,
            "application/octet-stream",
        ))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["message"], UPLOAD_FAILED);
}

#[tokio::test]
async fn test_upload_far_beyond_body_limit() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "images", "Images", &[]).await;
    let content = vec![0u8; TEST_MAX_FILE_SIZE as usize + 128 * 1024];

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(upload_form(
            &folder.id.to_string(),
            "huge.bin",
            &content,
            "application/octet-stream",
        ))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "message": UPLOAD_FAILED }));
}

#[tokio::test]
async fn test_upload_malformed_multipart() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .content_type("multipart/form-data; boundary=XYZ")
        .bytes("--XYZ\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n1".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_unknown_folder() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(upload_form("9999", "logo.png", b"png", "image/png"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["message"], UPLOAD_FAILED);
}

#[tokio::test]
async fn test_upload_missing_file() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "images", "Images", &[]).await;

    let response = ctx
        .server
        .post("/streams/files-field_type/handle")
        .add_header(AUTHORIZATION, admin_bearer())
        .multipart(MultipartForm::new().add_text("folder", folder.id.to_string()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["message"], UPLOAD_FAILED);
}

// ============================================================================
// Recent Uploads Tests
// ============================================================================

#[tokio::test]
async fn test_recent_skips_empty_tokens() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "docs", "Docs", &[]).await;

    let repo = FileRepository::new(ctx.db.pool());
    let first = repo
        .create(&NewFile::new(folder.id, "first.pdf", "aaaa.pdf", 10))
        .await
        .unwrap();
    repo.create(&NewFile::new(folder.id, "second.pdf", "bbbb.pdf", 10))
        .await
        .unwrap();
    let third = repo
        .create(&NewFile::new(folder.id, "third.pdf", "cccc.pdf", 10))
        .await
        .unwrap();

    let response = ctx
        .server
        .get("/streams/files-field_type/recent")
        .add_query_param("uploaded", format!("{},,{}", first.id, third.id))
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("first.pdf"));
    assert!(html.contains("third.pdf"));
    assert!(!html.contains("second.pdf"));
}

#[tokio::test]
async fn test_recent_without_uploads() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/streams/files-field_type/recent")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("No files have been uploaded yet."));
}

// ============================================================================
// Folder Browser Tests
// ============================================================================

#[tokio::test]
async fn test_folders_filtered_by_config() {
    let ctx = create_test_server().await;
    let images = create_folder(&ctx.db, "images", "Images", &["png"]).await;
    create_folder(&ctx.db, "docs", "Docs", &["pdf"]).await;

    ctx.cache.put(
        &cache_key("only-images"),
        json!({ "folders": ["images"] }),
        CONFIG_TTL_SECS,
    );

    let response = ctx
        .server
        .get("/streams/files-field_type/index/only-images")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Images"));
    assert!(!html.contains("Docs"));
    assert!(html.contains(&format!(
        "/streams/files-field_type/upload/{}?key=only-images",
        images.id
    )));
}

#[tokio::test]
async fn test_folders_lists_all_without_config() {
    let ctx = create_test_server().await;
    create_folder(&ctx.db, "images", "Images", &[]).await;
    create_folder(&ctx.db, "docs", "Docs", &[]).await;

    let response = ctx
        .server
        .get("/streams/files-field_type/index/unknown")
        .add_header(AUTHORIZATION, admin_bearer())
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Images"));
    assert!(html.contains("Docs"));
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_requires_token() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/streams/files-field_type/recent").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_rejects_foreign_token() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/streams/files-field_type/recent")
        .add_header(
            AUTHORIZATION,
            format!("Bearer {}", token_with("other-secret", ADMIN_ROLE, 3600)),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejects_non_admin() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/streams/files-field_type/recent")
        .add_header(AUTHORIZATION, member_bearer())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "FORBIDDEN");
}

// ============================================================================
// Service Routes
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/streams/files-field_type/handle"]["post"].is_object());
}

// ============================================================================
// Field Type Round Trip
// ============================================================================

#[tokio::test]
async fn test_field_config_flows_to_upload_and_entry() {
    let ctx = create_test_server().await;
    let folder = create_folder(&ctx.db, "docs", "Docs", &["pdf", "docx"]).await;

    let field = FilesFieldType::new(
        "attachments",
        FieldConfig::new()
            .with("allowed_types", json!(["pdf"]))
            .with("folders", json!(["docs"]))
            .with("max", 3),
        ctx.cache.clone(),
    );
    let key = field.config_key().unwrap();

    // The folder browser sees the field's folders.
    let response = ctx
        .server
        .get(&format!("/streams/files-field_type/index/{key}"))
        .add_header(AUTHORIZATION, admin_bearer())
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Docs"));

    // The upload view narrows the folder's types to the field's.
    let response = ctx
        .server
        .get("/streams/files-field_type/upload/docs")
        .add_query_param("key", &key)
        .add_header(AUTHORIZATION, admin_bearer())
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"accept=".pdf""#));
    assert!(html.contains("Select up to 3 files."));

    // Upload two files.
    let mut ids = Vec::new();
    for name in ["brief.pdf", "notes.pdf"] {
        let response = ctx
            .server
            .post("/streams/files-field_type/handle")
            .add_header(AUTHORIZATION, admin_bearer())
            .multipart(upload_form(
                &folder.id.to_string(),
                name,
                b"%PDF-1.4",
                "application/pdf",
            ))
            .await;
        response.assert_status_ok();
        ids.push(response.json::<Value>()["id"].as_i64().unwrap());
    }

    // Save them onto an entry in reverse order.
    let submitted = format!("{},{}", ids[1], ids[0]);
    let mut entry = EntryRecord::new("pages").with_id(1);
    {
        let values = HashMap::from([("attachments".to_string(), submitted)]);
        let mut form = FormContext::new(values, &mut entry);
        field.handle(&mut form);
    }
    entry.save_relations(ctx.db.pool()).await.unwrap();

    let relation = field.relation(&entry).unwrap();
    assert_eq!(relation.ids(ctx.db.pool()).await.unwrap(), vec![ids[1], ids[0]]);

    let views = Views::builtin().unwrap();
    let table = field.value_table(ctx.db.pool(), &views, &entry).await.unwrap();
    let notes = table.find("notes.pdf").unwrap();
    let brief = table.find("brief.pdf").unwrap();
    assert!(notes < brief);
}
