use axum::extract::{Extension, Json, State, rejection::JsonRejection};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    cache::{CachedSession, SessionCacheOperations},
    error::{AppError, AppResult},
    routes::Ack,
    utils::{Role, generate_token, hash_password, verify_password},
};

use super::model::{
    Credentials, LoginRequest, LoginResponse, NewUser, RegisterRequest, RegisterResponse,
    RoleChangeRequest, SessionUser, UserProfile, UserStatusResponse, current_role,
    record_role_change_request,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<RegisterResponse>> {
    let Json(req) = payload?;
    let full_name = req.full_name.trim();
    let email = req.email.trim();
    let password = req.password.trim();
    let phone_number = req.phone_number.trim();

    // Only tenant and owner can be self-registered.
    let role = match req.role.as_deref().map(str::parse::<Role>) {
        Some(Ok(Role::Owner)) => Role::Owner,
        _ => Role::Tenant,
    };

    if full_name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request(
            "Full name, email, and password are required",
        ));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("Invalid email format"));
    }
    if NewUser::email_taken(&state.pool, email).await? {
        return Err(AppError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(password)?;
    let user_id = NewUser {
        full_name,
        email,
        password_hash: &password_hash,
        phone_number: Some(phone_number).filter(|p| !p.is_empty()),
        role,
    }
    .insert(&state.pool)
    .await?;

    tracing::info!(user_id, %role, "registered new account pending approval");
    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful! Your account is pending approval. You will be notified once approved.",
        user_id,
        status: "pending",
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let email = req.email.trim();
    let password = req.password.trim();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }

    let Some(user) = Credentials::find_by_email(&state.pool, email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    let valid = verify_password(password, &user.password).unwrap_or_else(|e| {
        tracing::warn!(user_id = user.user_id, "stored password hash unreadable: {e}");
        false
    });
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let role: Role = user.role.parse().map_err(AppError::Internal)?;
    if role != Role::Admin {
        match user.status.as_str() {
            "approved" => {}
            "pending" => {
                return Err(AppError::NotApproved {
                    message: "Your account is pending approval. Please wait for admin approval.",
                    status: "pending",
                });
            }
            "rejected" => {
                return Err(AppError::NotApproved {
                    message: "Your account has been rejected. Please contact administrator.",
                    status: "rejected",
                });
            }
            _ => return Err(AppError::forbidden("Account not approved")),
        }
    }

    let session_id = Uuid::new_v4().to_string();
    let (token, expires_at) = generate_token(user.user_id, &session_id, role, &state.config)?;
    let session = CachedSession {
        session_id,
        user_id: user.user_id,
        full_name: user.full_name,
        email: user.email,
        role,
        created_at: Utc::now().timestamp(),
        expires_at,
    };
    SessionCacheOperations::cache_session(&state.redis, &session).await?;

    tracing::info!(user_id = session.user_id, %role, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        user: SessionUser::from(&session),
        token,
        expires_at,
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    session: Option<Extension<CachedSession>>,
) -> AppResult<Json<Ack>> {
    if let Some(Extension(session)) = session {
        SessionCacheOperations::remove_session(&state.redis, &session.session_id).await?;
        tracing::info!(user_id = session.user_id, "user logged out");
    }
    Ok(Json(Ack::new("Logged out successfully")))
}

pub async fn user_status(session: Option<Extension<CachedSession>>) -> Json<UserStatusResponse> {
    Json(match session {
        Some(Extension(session)) => UserStatusResponse {
            logged_in: true,
            user: Some(SessionUser::from(&session)),
        },
        None => UserStatusResponse {
            logged_in: false,
            user: None,
        },
    })
}

#[axum::debug_handler]
pub async fn user_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<UserProfile>> {
    UserProfile::find_by_id(&state.pool, session.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[axum::debug_handler]
pub async fn request_role_change(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    payload: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> AppResult<Json<Ack>> {
    let Json(req) = payload?;
    let requested = req.role.as_deref().unwrap_or("owner").trim().to_lowercase();
    if requested != "owner" {
        return Err(AppError::bad_request(
            "Invalid role. Can only request owner role.",
        ));
    }

    let Some(role) = current_role(&state.pool, session.user_id).await? else {
        return Err(AppError::not_found("User not found"));
    };
    match role.as_str() {
        "owner" => return Err(AppError::bad_request("You are already an owner")),
        "tenant" => {}
        _ => return Err(AppError::bad_request("Only tenants can request owner role")),
    }

    record_role_change_request(&state.pool, session.user_id, Role::Owner).await?;
    tracing::info!(user_id = session.user_id, "owner role requested");
    Ok(Json(Ack::new(
        "Role change request submitted. Waiting for admin approval.",
    )))
}
