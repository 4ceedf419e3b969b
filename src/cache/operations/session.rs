use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::session_key;
use crate::cache::models::CachedSession;

pub(crate) fn encode_error(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, "serialization error", e.to_string()))
}

pub(crate) fn decode_error(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, "deserialization error", e.to_string()))
}

pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// Stores a session that expires together with its token.
    pub async fn cache_session(
        redis: &Arc<RedisClient>,
        session: &CachedSession,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let ttl = (session.expires_at - session.created_at).max(1) as u64;
        let json = serde_json::to_string(session).map_err(encode_error)?;

        let _: () = conn
            .set_ex(session_key(&session.session_id), json, ttl)
            .await?;
        tracing::debug!(user_id = session.user_id, "session cached");

        Ok(())
    }

    pub async fn get_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<Option<CachedSession>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(session_id)).await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(decode_error)?)),
            None => Ok(None),
        }
    }

    pub async fn remove_session(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(session_key(session_id)).await?;

        Ok(())
    }
}
