use std::collections::HashMap;
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// Peers whose forwarding headers are believed when keying anonymous callers.
    pub trusted_proxies: Vec<IpAddr>,
    /// Absent key disables the assistant without failing startup.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ai_timeout_secs: u64,
    pub ai_rate_limit_requests: usize,
    pub ai_rate_limit_window_secs: u64,
    pub ai_min_delay_secs: u64,
    pub ai_cache_ttl_secs: u64,
    pub ai_cache_capacity: usize,
    pub query_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_expiration_hours: u64 = match vars.get("JWT_EXPIRATION") {
            Some(raw) => parse_value("JWT_EXPIRATION", raw.trim_end_matches('h'))?,
            None => 24,
        };

        Ok(Config {
            database_url: required(vars, "DATABASE_URL")?,
            redis_url: required(vars, "REDIS_URL")?,
            jwt_secret: required(vars, "JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration_hours * 3600,
            server_host: optional(vars, "SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(vars, "SERVER_PORT", 5000)?,
            api_base_uri: optional(vars, "API_BASE_URI").unwrap_or_else(|| "/api".into()),
            trusted_proxies: match optional(vars, "TRUSTED_PROXIES") {
                Some(raw) => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(|ip| parse_value("TRUSTED_PROXIES", ip))
                    .collect::<Result<_, _>>()?,
                None => Vec::new(),
            },
            gemini_api_key: optional(vars, "GOOGLE_API_KEY"),
            gemini_model: optional(vars, "GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".into()),
            ai_timeout_secs: parse_or(vars, "AI_TIMEOUT_SECS", 30)?,
            ai_rate_limit_requests: parse_or(vars, "AI_RATE_LIMIT_REQUESTS", 10)?,
            ai_rate_limit_window_secs: parse_or(vars, "AI_RATE_LIMIT_WINDOW", 60)?,
            ai_min_delay_secs: parse_or(vars, "AI_MIN_DELAY", 2)?,
            ai_cache_ttl_secs: parse_or(vars, "AI_CACHE_TTL", 300)?,
            ai_cache_capacity: parse_or(vars, "AI_CACHE_CAPACITY", 100)?,
            query_timeout_ms: parse_or(vars, "QUERY_TIMEOUT_MS", 5000)?,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn ai_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.ai_rate_limit_window_secs)
    }

    pub fn ai_min_delay(&self) -> Duration {
        Duration::from_secs(self.ai_min_delay_secs)
    }

    pub fn ai_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ai_cache_ttl_secs)
    }
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    optional(vars, key).ok_or(ConfigError::Missing(key))
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match optional(vars, key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
