use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// Select list for `Property`, expecting `properties` aliased as `p`.
pub const PROPERTY_COLUMNS: &str = "p.property_id::bigint AS property_id, \
    p.owner_id::bigint AS owner_id, p.property_name, p.description, p.location, \
    p.status::text AS status, p.date_posted::timestamp AS date_posted";

/// Select list for `Room`, expecting `rooms` aliased as `r`.
pub const ROOM_COLUMNS: &str = "r.room_id::bigint AS room_id, \
    r.property_id::bigint AS property_id, r.room_type::text AS room_type, \
    r.monthly_rate::float8 AS monthly_rate, r.description, \
    r.total_tenants::bigint AS total_tenants, \
    r.available_tenants::bigint AS available_tenants, \
    r.current_tenants::bigint AS current_tenants, r.house_rules";

/// Count of a property's live rooms that still take tenants.
const AVAILABLE_ROOMS: &str = "(SELECT COUNT(*) FROM rooms r \
    WHERE r.property_id = p.property_id AND r.deleted_at IS NULL \
    AND r.available_tenants > 0) AS available_rooms";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Property {
    pub property_id: i64,
    pub owner_id: i64,
    pub property_name: String,
    pub description: Option<String>,
    pub location: String,
    pub status: String,
    pub date_posted: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PropertyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub owner_name: String,
    pub available_rooms: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PropertyDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
    pub available_rooms: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Room {
    pub room_id: i64,
    pub property_id: i64,
    pub room_type: String,
    pub monthly_rate: f64,
    pub description: Option<String>,
    pub total_tenants: Option<i64>,
    pub available_tenants: i64,
    pub current_tenants: Option<i64>,
    pub house_rules: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Image {
    pub image_url: String,
    pub is_primary: bool,
}

impl PropertyListing {
    /// Approved, live listings, newest first.
    pub async fn approved(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROPERTY_COLUMNS}, u.full_name AS owner_name, {AVAILABLE_ROOMS}
            FROM properties p
            JOIN users u ON p.owner_id = u.user_id
            WHERE p.deleted_at IS NULL AND p.status = 'approved'
            ORDER BY p.date_posted DESC
            "#
        );
        sqlx::query_as::<_, PropertyListing>(&sql).fetch_all(pool).await
    }
}

impl PropertyDetail {
    pub async fn find(pool: &PgPool, property_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROPERTY_COLUMNS}, u.full_name AS owner_name, u.email AS owner_email,
                   u.phone_number AS owner_phone, {AVAILABLE_ROOMS}
            FROM properties p
            JOIN users u ON p.owner_id = u.user_id
            WHERE p.property_id = $1 AND p.deleted_at IS NULL
            "#
        );
        sqlx::query_as::<_, PropertyDetail>(&sql)
            .bind(property_id)
            .fetch_optional(pool)
            .await
    }
}

impl Room {
    pub async fn for_property(pool: &PgPool, property_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM rooms r
            WHERE r.property_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.room_type, r.monthly_rate
            "#
        );
        sqlx::query_as::<_, Room>(&sql)
            .bind(property_id)
            .fetch_all(pool)
            .await
    }
}

pub async fn amenities(pool: &PgPool, property_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT amenity_name FROM property_amenities WHERE property_id = $1 ORDER BY amenity_name",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await
}

impl Image {
    pub async fn for_property(pool: &PgPool, property_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Image>(
            r#"
            SELECT image_url, is_primary
            FROM property_images
            WHERE property_id = $1
            ORDER BY is_primary DESC, uploaded_at
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
    }

    pub async fn for_room(pool: &PgPool, room_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Image>(
            r#"
            SELECT image_url, is_primary
            FROM room_images
            WHERE room_id = $1
            ORDER BY is_primary DESC, uploaded_at
            "#,
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }
}
