mod auth;
mod client_origin;
mod error_handler;

pub use auth::{auth_middleware, optional_auth, require_admin, require_owner};
pub use client_origin::ClientOrigin;
pub use error_handler::log_errors;
