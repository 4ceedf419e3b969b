use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::routes::auth::{USER_PROFILE_COLUMNS, UserProfile};
use crate::routes::catalog::{PROPERTY_COLUMNS, Property};

/// Review outcome recorded on users and properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct PendingPropertyReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub owner_name: String,
    pub owner_email: String,
    pub total_rooms: i64,
}

pub async fn pending_users(pool: &PgPool) -> Result<Vec<UserProfile>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_PROFILE_COLUMNS}
        FROM users
        WHERE status = 'pending' AND deleted_at IS NULL
        ORDER BY date_registered DESC
        "#
    );
    sqlx::query_as::<_, UserProfile>(&sql).fetch_all(pool).await
}

pub async fn role_change_requests(pool: &PgPool) -> Result<Vec<UserProfile>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_PROFILE_COLUMNS}
        FROM users
        WHERE role_change_request IS NOT NULL
          AND status = 'approved'
          AND deleted_at IS NULL
        ORDER BY date_registered DESC
        "#
    );
    sqlx::query_as::<_, UserProfile>(&sql).fetch_all(pool).await
}

/// Returns whether a live account was updated.
pub async fn review_user(
    pool: &PgPool,
    user_id: i64,
    admin_id: i64,
    decision: Decision,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = $1, approved_by = $2, approved_at = NOW()
        WHERE user_id = $3 AND deleted_at IS NULL
        "#,
    )
    .bind(decision.as_str())
    .bind(admin_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Applies a pending role change, returning the new role when one was
/// requested.
pub async fn apply_role_change(
    pool: &PgPool,
    user_id: i64,
    admin_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let requested = sqlx::query_scalar::<_, String>(
        r#"
        SELECT role_change_request::text FROM users
        WHERE user_id = $1 AND role_change_request IS NOT NULL
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(new_role) = requested else {
        return Ok(None);
    };

    sqlx::query(
        r#"
        UPDATE users
        SET role = $1, role_change_request = NULL, approved_by = $2
        WHERE user_id = $3 AND deleted_at IS NULL
        "#,
    )
    .bind(&new_role)
    .bind(admin_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(new_role))
}

pub async fn clear_role_change(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET role_change_request = NULL WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

impl PendingPropertyReview {
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROPERTY_COLUMNS}, u.full_name AS owner_name, u.email AS owner_email,
                   (SELECT COUNT(*) FROM rooms r
                    WHERE r.property_id = p.property_id AND r.deleted_at IS NULL) AS total_rooms
            FROM properties p
            JOIN users u ON p.owner_id = u.user_id
            WHERE p.status = 'pending' AND p.deleted_at IS NULL
            ORDER BY p.date_posted DESC
            "#
        );
        sqlx::query_as::<_, PendingPropertyReview>(&sql)
            .fetch_all(pool)
            .await
    }
}

pub async fn review_property(
    pool: &PgPool,
    property_id: i64,
    admin_id: i64,
    decision: Decision,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE properties
        SET status = $1, approved_by = $2, approved_at = NOW()
        WHERE property_id = $3 AND deleted_at IS NULL
        "#,
    )
    .bind(decision.as_str())
    .bind(admin_id)
    .bind(property_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
