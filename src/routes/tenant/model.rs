use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Select list for `Booking`, expecting `bookings` aliased as `b`.
pub const BOOKING_COLUMNS: &str = "b.booking_id::bigint AS booking_id, \
    b.tenant_id::bigint AS tenant_id, b.room_id::bigint AS room_id, \
    b.start_date::date AS start_date, b.end_date::date AS end_date, \
    b.status::text AS status, b.created_at::timestamp AS created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub booking_id: i64,
    pub tenant_id: i64,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ActiveBooking {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub property_name: String,
    pub location: String,
    pub room_type: String,
    pub monthly_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct ActiveBookingResponse {
    pub has_active_booking: bool,
    pub booking: Option<ActiveBooking>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookingRequest {
    pub room_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    pub message: &'static str,
    pub booking_id: i64,
}

#[derive(Debug, FromRow)]
pub struct BookableRoom {
    pub room_id: i64,
    pub available_tenants: i64,
}

impl ActiveBooking {
    /// The tenant's most recent approved booking.
    pub async fn latest_for(pool: &PgPool, tenant_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {BOOKING_COLUMNS},
                   p.property_name, p.location,
                   r.room_type::text AS room_type, r.monthly_rate::float8 AS monthly_rate
            FROM bookings b
            JOIN rooms r ON b.room_id = r.room_id
            JOIN properties p ON r.property_id = p.property_id
            WHERE b.tenant_id = $1
              AND b.status = 'approved'
              AND b.deleted_at IS NULL
            ORDER BY b.created_at DESC
            LIMIT 1
            "#
        );
        sqlx::query_as::<_, ActiveBooking>(&sql)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }
}

pub async fn has_approved_booking(pool: &PgPool, tenant_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM bookings
            WHERE tenant_id = $1 AND status = 'approved' AND deleted_at IS NULL
        )
        "#,
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
}

impl BookableRoom {
    pub async fn find(pool: &PgPool, room_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookableRoom>(
            r#"
            SELECT r.room_id::bigint AS room_id, r.available_tenants::bigint AS available_tenants
            FROM rooms r
            JOIN properties p ON r.property_id = p.property_id
            WHERE r.room_id = $1 AND r.deleted_at IS NULL AND p.deleted_at IS NULL
            "#,
        )
        .bind(room_id)
        .fetch_optional(pool)
        .await
    }
}

/// Inserts a `pending` booking; dates are parsed by the database.
pub async fn insert_booking(
    pool: &PgPool,
    tenant_id: i64,
    room_id: i64,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bookings (tenant_id, room_id, start_date, end_date, status)
        VALUES ($1, $2, $3::date, $4::date, 'pending')
        RETURNING booking_id::bigint
        "#,
    )
    .bind(tenant_id)
    .bind(room_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
}
