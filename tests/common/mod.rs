//! Test helpers for upload controller integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use files_field_type::file::{FileStorage, FileUploader, Folder, FolderRepository, NewFolder};
use files_field_type::template::Views;
use files_field_type::web::handlers::AppState;
use files_field_type::web::middleware::{JwtClaims, JwtState, ADMIN_ROLE};
use files_field_type::web::router::{create_health_router, create_openapi_router, create_router};
use files_field_type::{Database, MemoryConfigCache};

/// Secret shared by the test server and the token helpers.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Upload size limit of the test server.
pub const TEST_MAX_FILE_SIZE: u64 = 1024;

/// A running test server with handles to its collaborators.
pub struct TestContext {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub cache: Arc<MemoryConfigCache>,
    pub storage_dir: TempDir,
}

/// Create a test server with an in-memory database and temporary storage.
pub async fn create_test_server() -> TestContext {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let cache = Arc::new(MemoryConfigCache::new());
    let storage_dir = TempDir::new().expect("Failed to create storage dir");

    let storage = FileStorage::new(storage_dir.path()).expect("Failed to create storage");
    let uploader = FileUploader::new(storage, TEST_MAX_FILE_SIZE);
    let views = Arc::new(Views::builtin().expect("Failed to load views"));

    let app_state = Arc::new(AppState::new(db.clone(), cache.clone(), uploader, views));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));

    let router = create_router(app_state, jwt_state, &[])
        .merge(create_health_router())
        .merge(create_openapi_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext {
        server,
        db,
        cache,
        storage_dir,
    }
}

/// Mint a token signed with `secret` for a user with `role`.
pub fn token_with(secret: &str, role: &str, exp_offset: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: 1,
        username: format!("{role}-user"),
        role: role.to_string(),
        iat: now as u64,
        exp: (now + exp_offset) as u64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode token")
}

/// Bearer header value for an administrator.
pub fn admin_bearer() -> String {
    format!("Bearer {}", token_with(TEST_SECRET, ADMIN_ROLE, 3600))
}

/// Bearer header value for a non-admin member.
pub fn member_bearer() -> String {
    format!("Bearer {}", token_with(TEST_SECRET, "member", 3600))
}

/// Create a folder accepting `types`.
pub async fn create_folder(db: &Database, slug: &str, name: &str, types: &[&str]) -> Folder {
    FolderRepository::new(db.pool())
        .create(
            &NewFolder::new(slug, name)
                .with_description(format!("{name} folder"))
                .with_allowed_types(types.iter().copied()),
        )
        .await
        .expect("Failed to create test folder")
}
