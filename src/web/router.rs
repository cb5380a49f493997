//! Router configuration for the upload controller.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{FileResponse, MessageResponse, UploadForm};
use super::handlers::{self, AppState};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};
use crate::ROUTE_PREFIX;

/// Headroom for multipart framing and the `folder` field.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// OpenAPI document of the upload controller.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::folders::folders,
        handlers::upload::index,
        handlers::upload::upload,
        handlers::upload::recent,
    ),
    components(schemas(FileResponse, MessageResponse, UploadForm)),
    modifiers(&BearerAuth),
    tags(
        (name = "upload", description = "Files field type upload controller")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the upload controller router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = app_state
        .uploader
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let routes = Router::new()
        .route("/index/:key", get(handlers::folders))
        .route("/upload/:folder", get(handlers::index))
        .route("/handle", post(handlers::upload))
        .route("/recent", get(handlers::recent));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest(ROUTE_PREFIX, routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the OpenAPI document router.
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
