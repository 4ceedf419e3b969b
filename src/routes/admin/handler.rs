use axum::extract::{Extension, Json, Path, State, rejection::PathRejection};

use crate::{
    AppState,
    cache::CachedSession,
    error::{AppError, AppResult},
    routes::{Ack, auth::UserProfile},
};

use super::model::{
    Decision, PendingPropertyReview, apply_role_change, clear_role_change, review_property,
    review_user,
};

pub async fn pending_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(super::model::pending_users(&state.pool).await?))
}

pub async fn role_change_requests(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(super::model::role_change_requests(&state.pool).await?))
}

async fn decide_user(
    state: &AppState,
    admin: &CachedSession,
    user_id: i64,
    decision: Decision,
) -> AppResult<()> {
    if !review_user(&state.pool, user_id, admin.user_id, decision).await? {
        return Err(AppError::not_found("User not found"));
    }
    tracing::info!(user_id, admin_id = admin.user_id, decision = decision.as_str(), "account reviewed");
    Ok(())
}

#[axum::debug_handler]
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(admin): Extension<CachedSession>,
    user_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(user_id) = user_id?;
    decide_user(&state, &admin, user_id, Decision::Approved).await?;
    Ok(Json(Ack::new("User approved successfully")))
}

#[axum::debug_handler]
pub async fn reject_user(
    State(state): State<AppState>,
    Extension(admin): Extension<CachedSession>,
    user_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(user_id) = user_id?;
    decide_user(&state, &admin, user_id, Decision::Rejected).await?;
    Ok(Json(Ack::new("User rejected successfully")))
}

#[axum::debug_handler]
pub async fn approve_role_change(
    State(state): State<AppState>,
    Extension(admin): Extension<CachedSession>,
    user_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(user_id) = user_id?;
    let Some(new_role) = apply_role_change(&state.pool, user_id, admin.user_id).await? else {
        return Err(AppError::not_found("Role change request not found"));
    };

    tracing::info!(user_id, %new_role, "role change approved");
    Ok(Json(Ack::new(format!("Role changed to {new_role} successfully"))))
}

pub async fn reject_role_change(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(user_id) = user_id?;
    if !clear_role_change(&state.pool, user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    Ok(Json(Ack::new("Role change request rejected")))
}

pub async fn pending_properties(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PendingPropertyReview>>> {
    Ok(Json(PendingPropertyReview::all(&state.pool).await?))
}

async fn decide_property(
    state: &AppState,
    admin: &CachedSession,
    property_id: i64,
    decision: Decision,
) -> AppResult<()> {
    if !review_property(&state.pool, property_id, admin.user_id, decision).await? {
        return Err(AppError::not_found("Property not found"));
    }
    tracing::info!(property_id, admin_id = admin.user_id, decision = decision.as_str(), "listing reviewed");
    Ok(())
}

#[axum::debug_handler]
pub async fn approve_property(
    State(state): State<AppState>,
    Extension(admin): Extension<CachedSession>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(property_id) = property_id?;
    decide_property(&state, &admin, property_id, Decision::Approved).await?;
    Ok(Json(Ack::new("Property approved successfully")))
}

#[axum::debug_handler]
pub async fn reject_property(
    State(state): State<AppState>,
    Extension(admin): Extension<CachedSession>,
    property_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Ack>> {
    let Path(property_id) = property_id?;
    decide_property(&state, &admin, property_id, Decision::Rejected).await?;
    Ok(Json(Ack::new("Property rejected")))
}
