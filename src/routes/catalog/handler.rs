use axum::extract::{Json, Path, State, rejection::PathRejection};

use crate::{
    AppState,
    error::{AppError, AppResult},
};

use super::model::{Image, PropertyDetail, PropertyListing, Room, amenities};

pub async fn list_properties(State(state): State<AppState>) -> AppResult<Json<Vec<PropertyListing>>> {
    Ok(Json(PropertyListing::approved(&state.pool).await?))
}

#[axum::debug_handler]
pub async fn get_property(
    State(state): State<AppState>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<PropertyDetail>> {
    let Path(property_id) = property_id?;
    PropertyDetail::find(&state.pool, property_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Property not found"))
}

pub async fn property_rooms(
    State(state): State<AppState>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Room>>> {
    let Path(property_id) = property_id?;
    Ok(Json(Room::for_property(&state.pool, property_id).await?))
}

pub async fn property_amenities(
    State(state): State<AppState>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<String>>> {
    let Path(property_id) = property_id?;
    Ok(Json(amenities(&state.pool, property_id).await?))
}

pub async fn property_images(
    State(state): State<AppState>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Image>>> {
    let Path(property_id) = property_id?;
    Ok(Json(Image::for_property(&state.pool, property_id).await?))
}

pub async fn room_images(
    State(state): State<AppState>,
    room_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Image>>> {
    let Path(room_id) = room_id?;
    Ok(Json(Image::for_room(&state.pool, room_id).await?))
}
