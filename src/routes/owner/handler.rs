use axum::extract::{
    Extension, Json, Path, State,
    rejection::{JsonRejection, PathRejection},
};

use crate::{
    AppState,
    assistant::ChatEnvelope,
    cache::CachedSession,
    error::{AppError, AppResult},
    middleware::ClientOrigin,
    routes::assistant::ChatRequest,
};

use super::model::{
    AddRoomRequest, AddRoomResponse, BOOKING_STATUSES, BookingStatusRequest,
    BookingStatusResponse, CreatePropertyRequest, CreatePropertyResponse, NewRoom, OwnerBooking,
    OwnerProperty, PendingProperty, TenantSummary, insert_property, owns_property,
};

pub async fn properties(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<Vec<OwnerProperty>>> {
    Ok(Json(OwnerProperty::for_owner(&state.pool, session.user_id).await?))
}

pub async fn pending_properties(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<Vec<PendingProperty>>> {
    Ok(Json(
        PendingProperty::for_owner(&state.pool, session.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn create_property(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    payload: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> AppResult<Json<CreatePropertyResponse>> {
    let Json(req) = payload?;
    let property_name = req.property_name.trim();
    let location = req.location.trim();

    if property_name.is_empty() || location.is_empty() {
        return Err(AppError::bad_request(
            "Property name and location are required",
        ));
    }

    let amenities: Vec<&str> = req
        .amenities
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    let property_id = insert_property(
        &state.pool,
        session.user_id,
        property_name,
        req.description.trim(),
        location,
        &amenities,
    )
    .await?;

    tracing::info!(property_id, owner_id = session.user_id, "property submitted for approval");
    Ok(Json(CreatePropertyResponse {
        success: true,
        message: "Property created successfully! Waiting for admin approval.",
        property_id,
    }))
}

#[axum::debug_handler]
pub async fn add_room(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    payload: Result<Json<AddRoomRequest>, JsonRejection>,
) -> AppResult<Json<AddRoomResponse>> {
    let Json(req) = payload?;

    let (Some(property_id), Some(monthly_rate)) = (req.property_id, req.monthly_rate) else {
        return Err(AppError::bad_request(
            "Property ID and monthly rate are required",
        ));
    };

    let room_type = req.room_type.as_deref().unwrap_or("Single");
    if !matches!(room_type, "Single" | "Shared") {
        return Err(AppError::bad_request("Room type must be Single or Shared"));
    }

    if !owns_property(&state.pool, property_id, session.user_id).await? {
        return Err(AppError::forbidden("Property not found or access denied"));
    }

    let room_id = NewRoom {
        property_id,
        room_type,
        monthly_rate,
        description: req.description.trim(),
        total_tenants: req.total_tenants.unwrap_or(1),
        house_rules: req.house_rules.trim(),
    }
    .insert(&state.pool)
    .await?;

    tracing::info!(room_id, property_id, "room added");
    Ok(Json(AddRoomResponse {
        success: true,
        message: "Room added successfully",
        room_id,
    }))
}

pub async fn bookings(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<Vec<OwnerBooking>>> {
    Ok(Json(OwnerBooking::for_owner(&state.pool, session.user_id).await?))
}

/// Room availability and booking history follow from database triggers on
/// the status column.
#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    booking_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookingStatusRequest>, JsonRejection>,
) -> AppResult<Json<BookingStatusResponse>> {
    let Path(booking_id) = booking_id?;
    let Json(req) = payload?;

    let new_status = req.status.unwrap_or_default();
    if !BOOKING_STATUSES.contains(&new_status.as_str()) {
        return Err(AppError::bad_request("Invalid status"));
    }

    let Some(old_status) =
        OwnerBooking::status_for_owner(&state.pool, booking_id, session.user_id).await?
    else {
        return Err(AppError::not_found("Booking not found or unauthorized"));
    };

    OwnerBooking::set_status(&state.pool, booking_id, &new_status).await?;

    tracing::info!(booking_id, %old_status, %new_status, "booking status changed");
    Ok(Json(BookingStatusResponse {
        success: true,
        message: format!("Booking status updated to {new_status}"),
        old_status,
        new_status,
    }))
}

pub async fn tenants(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<Vec<TenantSummary>>> {
    Ok(Json(TenantSummary::for_owner(&state.pool, session.user_id).await?))
}

#[axum::debug_handler]
pub async fn tenant_chat(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    origin: ClientOrigin,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatEnvelope>> {
    let Json(req) = payload?;

    let tenants = TenantSummary::for_owner(&state.pool, session.user_id);
    let envelope = state
        .gateway
        .ask_about_tenants(session.user_id, origin.as_str(), req.message(), tenants)
        .await?;
    Ok(Json(envelope))
}
