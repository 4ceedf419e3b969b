use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    cache::{CachedSession, SessionCacheOperations},
    error::AppError,
    utils::{Claims, Role, verify_token},
};

/// Resolves a bearer token to its claims and live session. `None` when the
/// token is invalid or the session was revoked.
async fn resolve_session(
    state: &AppState,
    token: &str,
) -> Result<Option<(Claims, CachedSession)>, AppError> {
    let claims = match verify_token(token, &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("rejected bearer token: {e}");
            return Ok(None);
        }
    };

    let session = SessionCacheOperations::get_session(&state.redis, &claims.sid).await?;
    Ok(session
        .filter(|session| session.user_id == claims.sub)
        .map(|session| (claims, session)))
}

/// Requires a valid session and exposes `Claims` and `CachedSession` to handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::Unauthorized);
    };

    let Some((claims, session)) = resolve_session(&state, bearer.token()).await? else {
        return Err(AppError::Unauthorized);
    };

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Like `auth_middleware`, but anonymous callers pass through untouched.
pub async fn optional_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        if let Some((claims, session)) = resolve_session(&state, bearer.token()).await? {
            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(session);
        }
    }
    Ok(next.run(req).await)
}

fn require_role(req: &Request, role: Role) -> Result<(), AppError> {
    let session = req
        .extensions()
        .get::<CachedSession>()
        .ok_or(AppError::Unauthorized)?;

    if session.role != role {
        let message = match role {
            Role::Owner => "Unauthorized. Owner access required.",
            Role::Admin => "Unauthorized. Admin access required.",
            Role::Tenant => "Unauthorized. Tenant access required.",
        };
        return Err(AppError::forbidden(message));
    }
    Ok(())
}

pub async fn require_owner(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(&req, Role::Owner)?;
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(&req, Role::Admin)?;
    Ok(next.run(req).await)
}
