use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use super::session::{decode_error, encode_error};
use crate::cache::keys::owner_todos_key;
use crate::cache::models::CachedTodo;
use crate::cache::models::todo::TodoChanges;

pub struct TodoCacheOperations;

impl TodoCacheOperations {
    /// All of an owner's to-dos, oldest first.
    pub async fn list(
        redis: &Arc<RedisClient>,
        owner_id: i64,
    ) -> Result<Vec<CachedTodo>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let entries: HashMap<String, String> = conn.hgetall(owner_todos_key(owner_id)).await?;
        let mut todos = entries
            .values()
            .map(|json| serde_json::from_str::<CachedTodo>(json).map_err(decode_error))
            .collect::<Result<Vec<_>, _>>()?;
        todos.sort_by_key(|todo| todo.id);

        Ok(todos)
    }

    /// Inserts `todo`, bumping its id until it does not collide with an
    /// existing entry. Returns the stored value.
    pub async fn create(
        redis: &Arc<RedisClient>,
        owner_id: i64,
        mut todo: CachedTodo,
    ) -> Result<CachedTodo, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let key = owner_todos_key(owner_id);

        loop {
            let json = serde_json::to_string(&todo).map_err(encode_error)?;
            let inserted: bool = conn.hset_nx(&key, todo.id, json).await?;
            if inserted {
                return Ok(todo);
            }
            todo.id += 1;
        }
    }

    /// Applies `changes` to one to-do; `None` when the id is unknown.
    pub async fn update(
        redis: &Arc<RedisClient>,
        owner_id: i64,
        todo_id: i64,
        changes: TodoChanges,
    ) -> Result<Option<CachedTodo>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let key = owner_todos_key(owner_id);

        let current: Option<String> = conn.hget(&key, todo_id).await?;
        let Some(json) = current else {
            return Ok(None);
        };

        let mut todo: CachedTodo = serde_json::from_str(&json).map_err(decode_error)?;
        todo.apply(changes);

        let json = serde_json::to_string(&todo).map_err(encode_error)?;
        let _: () = conn.hset(&key, todo_id, json).await?;

        Ok(Some(todo))
    }

    pub async fn delete(
        redis: &Arc<RedisClient>,
        owner_id: i64,
        todo_id: i64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.hdel(owner_todos_key(owner_id), todo_id).await?;

        Ok(())
    }
}
