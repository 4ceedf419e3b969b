use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors, optional_auth, require_admin, require_owner},
};

pub mod admin;
pub mod assistant;
pub mod auth;
pub mod catalog;
pub mod owner;
pub mod tenant;
pub mod todo;

/// `{success: true, message}` acknowledgement used by state-changing routes.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Builds the full API router with state applied.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/schema", get(assistant::schema))
        .route("/properties", get(catalog::list_properties))
        .route("/properties/{property_id}", get(catalog::get_property))
        .route("/properties/{property_id}/rooms", get(catalog::property_rooms))
        .route(
            "/properties/{property_id}/amenities",
            get(catalog::property_amenities),
        )
        .route("/properties/{property_id}/images", get(catalog::property_images))
        .route("/rooms/{room_id}/images", get(catalog::room_images));

    // Anonymous callers allowed; a valid session is picked up when present.
    let session_aware_routes = Router::new()
        .route("/chat", post(assistant::chat))
        .route("/user-status", get(auth::user_status))
        .route("/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    let owner_routes = Router::new()
        .route("/owner/properties", get(owner::properties))
        .route("/owner/pending-properties", get(owner::pending_properties))
        .route("/owner/create-property", post(owner::create_property))
        .route("/owner/add-room", post(owner::add_room))
        .route("/owner/bookings", get(owner::bookings))
        .route(
            "/owner/bookings/{booking_id}/status",
            put(owner::update_booking_status),
        )
        .route("/owner/tenants", get(owner::tenants))
        .route("/owner/tenant-chat", post(owner::tenant_chat))
        .route("/owner/todos", get(todo::list_todos).post(todo::create_todo))
        .route(
            "/owner/todos/{todo_id}",
            put(todo::update_todo).delete(todo::delete_todo),
        )
        .route_layer(from_fn(require_owner));

    let admin_routes = Router::new()
        .route("/query", post(assistant::run_query))
        .route("/admin/pending-users", get(admin::pending_users))
        .route("/admin/approve-user/{user_id}", post(admin::approve_user))
        .route("/admin/reject-user/{user_id}", post(admin::reject_user))
        .route("/admin/role-change-requests", get(admin::role_change_requests))
        .route(
            "/admin/approve-role-change/{user_id}",
            post(admin::approve_role_change),
        )
        .route(
            "/admin/reject-role-change/{user_id}",
            post(admin::reject_role_change),
        )
        .route("/admin/pending-properties", get(admin::pending_properties))
        .route(
            "/admin/approve-property/{property_id}",
            post(admin::approve_property),
        )
        .route(
            "/admin/reject-property/{property_id}",
            post(admin::reject_property),
        )
        .route_layer(from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/user-profile", get(auth::user_profile))
        .route("/request-role-change", post(auth::request_role_change))
        .route("/tenant/active-booking", get(tenant::active_booking))
        .route("/bookings", post(tenant::create_booking))
        .merge(owner_routes)
        .merge(admin_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes)
        .merge(session_aware_routes)
        .merge(protected_routes);

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };

    router
        .layer(from_fn(log_errors))
        .with_state(state)
}
