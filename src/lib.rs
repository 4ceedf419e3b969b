use config::Config;
use redis::Client as RedisClient;
use sqlx::PgPool;
use std::sync::Arc;

pub mod assistant;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod utils;

pub mod routes;

use assistant::ChatGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub gateway: Arc<ChatGateway>,
}
