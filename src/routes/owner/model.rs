use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::routes::catalog::{PROPERTY_COLUMNS, Property};
use crate::routes::tenant::{BOOKING_COLUMNS, Booking};

pub const BOOKING_STATUSES: [&str; 5] = ["pending", "approved", "rejected", "cancelled", "completed"];

const TOTAL_ROOMS: &str = "(SELECT COUNT(*) FROM rooms r \
    WHERE r.property_id = p.property_id AND r.deleted_at IS NULL) AS total_rooms";

#[derive(Debug, Serialize, FromRow)]
pub struct OwnerProperty {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub total_rooms: i64,
    pub available_rooms: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PendingProperty {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub total_rooms: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct OwnerBooking {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub tenant_name: String,
    pub tenant_email: String,
    pub tenant_phone: Option<String>,
    pub room_type: String,
    pub monthly_rate: f64,
    pub property_name: String,
    pub location: String,
}

/// One tenant's bookings across an owner's properties.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TenantSummary {
    pub tenant_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub properties_rented: Option<String>,
    pub room_types: Option<String>,
    pub avg_monthly_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePropertyRequest {
    pub property_name: String,
    pub description: String,
    pub location: String,
    pub amenities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePropertyResponse {
    pub success: bool,
    pub message: &'static str,
    pub property_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddRoomRequest {
    pub property_id: Option<i64>,
    pub room_type: Option<String>,
    pub monthly_rate: Option<f64>,
    pub description: String,
    pub total_tenants: Option<i64>,
    pub house_rules: String,
}

#[derive(Debug, Serialize)]
pub struct AddRoomResponse {
    pub success: bool,
    pub message: &'static str,
    pub room_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingStatusResponse {
    pub success: bool,
    pub message: String,
    pub old_status: String,
    pub new_status: String,
}

pub struct NewRoom<'a> {
    pub property_id: i64,
    pub room_type: &'a str,
    pub monthly_rate: f64,
    pub description: &'a str,
    pub total_tenants: i64,
    pub house_rules: &'a str,
}

impl OwnerProperty {
    /// Pending first, then approved, then rejected; newest first within each.
    pub async fn for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROPERTY_COLUMNS}, {TOTAL_ROOMS},
                   (SELECT COUNT(*) FROM rooms r
                    WHERE r.property_id = p.property_id AND r.deleted_at IS NULL
                      AND r.available_tenants > 0) AS available_rooms
            FROM properties p
            WHERE p.owner_id = $1 AND p.deleted_at IS NULL
            ORDER BY
                CASE p.status::text
                    WHEN 'pending' THEN 1
                    WHEN 'approved' THEN 2
                    WHEN 'rejected' THEN 3
                END,
                p.date_posted DESC
            "#
        );
        sqlx::query_as::<_, OwnerProperty>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}

impl PendingProperty {
    pub async fn for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROPERTY_COLUMNS}, {TOTAL_ROOMS}
            FROM properties p
            WHERE p.owner_id = $1 AND p.status = 'pending' AND p.deleted_at IS NULL
            ORDER BY p.date_posted DESC
            "#
        );
        sqlx::query_as::<_, PendingProperty>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}

impl OwnerBooking {
    pub async fn for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {BOOKING_COLUMNS},
                   u.full_name AS tenant_name,
                   u.email AS tenant_email,
                   u.phone_number AS tenant_phone,
                   r.room_type::text AS room_type, r.monthly_rate::float8 AS monthly_rate,
                   p.property_name, p.location
            FROM bookings b
            JOIN rooms r ON b.room_id = r.room_id
            JOIN properties p ON r.property_id = p.property_id
            JOIN users u ON b.tenant_id = u.user_id
            WHERE p.owner_id = $1 AND b.deleted_at IS NULL
            ORDER BY b.created_at DESC
            "#
        );
        sqlx::query_as::<_, OwnerBooking>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Current status of a booking on one of the owner's rooms.
    pub async fn status_for_owner(
        pool: &PgPool,
        booking_id: i64,
        owner_id: i64,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT b.status::text
            FROM bookings b
            JOIN rooms r ON b.room_id = r.room_id
            JOIN properties p ON r.property_id = p.property_id
            WHERE b.booking_id = $1 AND p.owner_id = $2 AND b.deleted_at IS NULL
            "#,
        )
        .bind(booking_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_status(pool: &PgPool, booking_id: i64, status: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bookings SET status = $1 WHERE booking_id = $2")
            .bind(status)
            .bind(booking_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

impl TenantSummary {
    pub async fn for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TenantSummary>(
            r#"
            SELECT
                u.user_id::bigint AS tenant_id,
                u.full_name,
                u.email,
                u.phone_number,
                COUNT(DISTINCT b.booking_id) AS total_bookings,
                COUNT(DISTINCT CASE WHEN b.status = 'approved' THEN b.booking_id END) AS active_bookings,
                string_agg(DISTINCT p.property_name, ', ') AS properties_rented,
                string_agg(DISTINCT r.room_type::text, ', ') AS room_types,
                AVG(r.monthly_rate)::float8 AS avg_monthly_rate
            FROM users u
            JOIN bookings b ON u.user_id = b.tenant_id
            JOIN rooms r ON b.room_id = r.room_id
            JOIN properties p ON r.property_id = p.property_id
            WHERE p.owner_id = $1 AND b.deleted_at IS NULL AND u.deleted_at IS NULL
            GROUP BY u.user_id, u.full_name, u.email, u.phone_number
            ORDER BY u.full_name
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}

/// Creates a `pending` property with its amenities in one transaction.
pub async fn insert_property(
    pool: &PgPool,
    owner_id: i64,
    property_name: &str,
    description: &str,
    location: &str,
    amenities: &[&str],
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let property_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO properties (owner_id, property_name, description, location, status)
        VALUES ($1, $2, $3, $4, 'pending')
        RETURNING property_id::bigint
        "#,
    )
    .bind(owner_id)
    .bind(property_name)
    .bind(description)
    .bind(location)
    .fetch_one(&mut *tx)
    .await?;

    for amenity in amenities {
        sqlx::query("INSERT INTO property_amenities (property_id, amenity_name) VALUES ($1, $2)")
            .bind(property_id)
            .bind(*amenity)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(property_id)
}

pub async fn owns_property(pool: &PgPool, property_id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM properties
            WHERE property_id = $1 AND owner_id = $2 AND deleted_at IS NULL
        )
        "#,
    )
    .bind(property_id)
    .bind(owner_id)
    .fetch_one(pool)
    .await
}

impl NewRoom<'_> {
    /// Inserts the room with every place available.
    pub async fn insert(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO rooms (property_id, room_type, monthly_rate, description,
                               total_tenants, available_tenants, house_rules)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            RETURNING room_id::bigint
            "#,
        )
        .bind(self.property_id)
        .bind(self.room_type)
        .bind(self.monthly_rate)
        .bind(self.description)
        .bind(self.total_tenants)
        .bind(self.house_rules)
        .fetch_one(pool)
        .await
    }
}
