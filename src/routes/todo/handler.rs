use axum::extract::{
    Extension, Json, Path, State,
    rejection::{JsonRejection, PathRejection},
};
use chrono::Utc;

use crate::{
    AppState,
    cache::{CachedSession, CachedTodo, TodoCacheOperations, models::todo::TodoChanges},
    error::{AppError, AppResult},
};

use super::model::{CreateTodoRequest, DeletedResponse};

pub async fn list_todos(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
) -> AppResult<Json<Vec<CachedTodo>>> {
    Ok(Json(
        TodoCacheOperations::list(&state.redis, session.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> AppResult<Json<CachedTodo>> {
    let Json(req) = payload?;
    let todo = req.into_todo(Utc::now());
    let todo = TodoCacheOperations::create(&state.redis, session.user_id, todo).await?;
    Ok(Json(todo))
}

#[axum::debug_handler]
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    todo_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoChanges>, JsonRejection>,
) -> AppResult<Json<CachedTodo>> {
    let Path(todo_id) = todo_id?;
    let Json(changes) = payload?;

    TodoCacheOperations::update(&state.redis, session.user_id, todo_id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Todo not found"))
}

/// Deleting an unknown id still succeeds.
#[axum::debug_handler]
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CachedSession>,
    todo_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<DeletedResponse>> {
    let Path(todo_id) = todo_id?;
    TodoCacheOperations::delete(&state.redis, session.user_id, todo_id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
