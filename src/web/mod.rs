//! HTTP surface of the files field type.
//!
//! Serves the admin upload controller under `/streams/files-field_type`:
//! the folder browser, the upload view, the upload endpoint and the recent
//! uploads table.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_router, ApiDoc};
pub use server::WebServer;
