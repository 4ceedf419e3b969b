use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::cache::CachedSession;
use crate::utils::Role;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub user_id: i64,
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<&CachedSession> for SessionUser {
    fn from(session: &CachedSession) -> Self {
        Self {
            user_id: session.user_id,
            full_name: session.full_name.clone(),
            email: session.email.clone(),
            role: session.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleChangeRequest {
    #[serde(default)]
    pub role: Option<String>,
}

/// Login lookup row; never serialized.
#[derive(Debug, FromRow)]
pub struct Credentials {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub status: String,
}

impl Credentials {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credentials>(
            r#"
            SELECT user_id::bigint AS user_id, full_name, email, password,
                   role::text AS role, status::text AS status
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub status: String,
    pub role_change_request: Option<String>,
    pub date_registered: Option<NaiveDateTime>,
}

pub const USER_PROFILE_COLUMNS: &str = "user_id::bigint AS user_id, full_name, email, \
    phone_number, role::text AS role, status::text AS status, \
    role_change_request::text AS role_change_request, \
    date_registered::timestamp AS date_registered";

impl UserProfile {
    pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_PROFILE_COLUMNS} FROM users WHERE user_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}

pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone_number: Option<&'a str>,
    pub role: Role,
}

impl NewUser<'_> {
    pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)",
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Inserts the account as `pending` and returns its id.
    pub async fn insert(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (full_name, email, password, phone_number, role, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING user_id::bigint
            "#,
        )
        .bind(self.full_name)
        .bind(self.email)
        .bind(self.password_hash)
        .bind(self.phone_number)
        .bind(self.role.as_str())
        .fetch_one(pool)
        .await
    }
}

pub async fn current_role(pool: &PgPool, user_id: i64) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT role::text FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn record_role_change_request(
    pool: &PgPool,
    user_id: i64,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role_change_request = $1 WHERE user_id = $2")
        .bind(role.as_str())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
