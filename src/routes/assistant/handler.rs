use axum::extract::{Extension, Json, State, rejection::JsonRejection};

use crate::{
    AppState,
    assistant::{ChatEnvelope, guard, schema::schema_descriptor, store::Row},
    cache::CachedSession,
    error::{AppError, AppResult},
    middleware::ClientOrigin,
};

use super::model::{ChatRequest, QueryRequest, SchemaResponse};

#[axum::debug_handler]
pub async fn chat(
    State(state): State<AppState>,
    session: Option<Extension<CachedSession>>,
    origin: ClientOrigin,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatEnvelope>> {
    let Json(req) = payload?;
    let principal = session.map(|Extension(session)| session.user_id);

    let envelope = state
        .gateway
        .ask(principal, origin.as_str(), req.message())
        .await?;
    Ok(Json(envelope))
}

pub async fn schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        schema: schema_descriptor(),
    })
}

/// Runs a caller-supplied SELECT verbatim, without rate limiting or name
/// resolution.
#[axum::debug_handler]
pub async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Row>>> {
    let Json(req) = payload?;
    let sql = req.query.unwrap_or_default();
    let sql = sql.trim();

    if guard::validate(sql).is_err() {
        return Err(AppError::bad_request("Only SELECT queries are allowed"));
    }

    let rows = state.gateway.store().fetch_rows(sql).await?;
    tracing::info!(rows = rows.len(), "ad hoc query executed");
    Ok(Json(rows))
}
