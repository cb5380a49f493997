//! Middleware for the upload controller.

pub mod auth;
pub mod cors;

pub use auth::{jwt_auth, AdminUser, JwtClaims, JwtState, ADMIN_ROLE};
pub use cors::create_cors_layer;
