use serde::{Deserialize, Serialize};

use crate::utils::Role;

/// Server-side half of a login; the JWT carries only its id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedSession {
    pub session_id: String,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}
