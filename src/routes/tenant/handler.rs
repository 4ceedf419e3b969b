use axum::extract::{Extension, Json, State, rejection::JsonRejection};

use crate::{
    AppState,
    cache::CachedSession,
    error::{AppError, AppResult},
    utils::Role,
};

use super::model::{
    ActiveBooking, ActiveBookingResponse, BookableRoom, CreateBookingRequest,
    CreateBookingResponse, has_approved_booking, insert_booking,
};

#[axum::debug_handler]
pub async fn active_booking(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<ActiveBookingResponse>> {
    if session.role != Role::Tenant {
        return Err(AppError::forbidden("Only tenants can check active bookings"));
    }

    let booking = ActiveBooking::latest_for(&state.pool, session.user_id).await?;
    Ok(Json(ActiveBookingResponse {
        has_active_booking: booking.is_some(),
        booking,
    }))
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<Json<CreateBookingResponse>> {
    if session.role != Role::Tenant {
        return Err(AppError::forbidden("Only tenants can create bookings"));
    }

    if has_approved_booking(&state.pool, session.user_id).await? {
        return Err(AppError::bad_request(
            "You already have an active booking. Please cancel your current booking before creating a new one.",
        ));
    }

    let Json(req) = payload?;
    let start_date = req.start_date.as_deref().map(str::trim).unwrap_or_default();
    let (Some(room_id), false) = (req.room_id, start_date.is_empty()) else {
        return Err(AppError::bad_request("Room ID and start date are required"));
    };
    let end_date = req.end_date.as_deref().map(str::trim).filter(|d| !d.is_empty());

    let Some(room) = BookableRoom::find(&state.pool, room_id).await? else {
        return Err(AppError::not_found("Room not found"));
    };
    if room.available_tenants <= 0 {
        return Err(AppError::bad_request("Room is fully booked"));
    }

    let booking_id =
        insert_booking(&state.pool, session.user_id, room.room_id, start_date, end_date).await?;

    tracing::info!(booking_id, tenant_id = session.user_id, room_id, "booking requested");
    Ok(Json(CreateBookingResponse {
        success: true,
        message: "Booking request submitted successfully! Waiting for owner approval.",
        booking_id,
    }))
}
