//! Web server for the upload controller.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::cache::ConfigCache;
use crate::config::Config;
use crate::file::{FileStorage, FileUploader};
use crate::template::Views;
use crate::{Database, FieldTypeError, Result};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::{create_health_router, create_openapi_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// `cache` must be the same cache the field type writes its
    /// configuration into.
    pub fn new(config: &Config, db: Database, cache: Arc<dyn ConfigCache>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FieldTypeError::Config(format!("invalid server address: {e}")))?;

        let storage = FileStorage::new(&config.files.storage_path)?;
        tracing::info!("File storage initialized at: {}", config.files.storage_path);
        let uploader = FileUploader::new(storage, config.files.max_upload_bytes());

        let views = Arc::new(Views::builtin()?);
        let app_state = AppState::new(Arc::new(db), cache, uploader, views)
            .with_config_ttl(config.cache.config_ttl_secs);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&config.auth.jwt_secret)),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared application state.
    pub fn app_state(&self) -> &Arc<AppState> {
        &self.app_state
    }

    /// Build the complete router.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
        .merge(create_openapi_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryConfigCache;
    use tempfile::TempDir;

    fn create_test_config(storage: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.auth.jwt_secret = "test-secret-key".to_string();
        config.files.storage_path = storage.path().to_string_lossy().to_string();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let storage = TempDir::new().unwrap();
        let config = create_test_config(&storage);
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db, Arc::new(MemoryConfigCache::new())).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_files_field_shares_cache() {
        let storage = TempDir::new().unwrap();
        let config = create_test_config(&storage);
        let db = Database::open_in_memory().await.unwrap();
        let server = WebServer::new(&config, db, Arc::new(MemoryConfigCache::new())).unwrap();

        let field = server.app_state().files_field(
            "gallery",
            crate::FieldConfig::new().with("allowed_types", serde_json::json!(["png"])),
        );
        let key = field.config_key().unwrap();

        let cached = server.app_state().field_config(&key);
        assert_eq!(cached.allowed_types(), vec!["png".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let storage = TempDir::new().unwrap();
        let mut config = create_test_config(&storage);
        config.server.host = "not an address".to_string();
        let db = Database::open_in_memory().await.unwrap();

        let result = WebServer::new(&config, db, Arc::new(MemoryConfigCache::new()));
        assert!(matches!(result, Err(FieldTypeError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let storage = TempDir::new().unwrap();
        let config = create_test_config(&storage);
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db, Arc::new(MemoryConfigCache::new())).unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);
    }
}
