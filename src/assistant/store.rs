use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

/// One result row: column name to value, in select-list order.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, sqlx::Error>;
}

/// Batch lookups used to put names next to foreign keys.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn user_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error>;
    async fn property_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error>;
    /// `"<property_name> - <room_type>"` per room.
    async fn room_labels(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgQueryStore {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl PgQueryStore {
    pub fn new(pool: PgPool, statement_timeout_ms: u64) -> Self {
        Self {
            pool,
            statement_timeout_ms,
        }
    }
}

fn wrap_for_json(sql: &str) -> String {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT COALESCE(json_agg(result), '[]'::json) FROM ({statement}) AS result")
}

fn into_rows(value: Value) -> Result<Vec<Row>, sqlx::Error> {
    let Value::Array(items) = value else {
        return Err(sqlx::Error::Protocol("query did not produce a row list".into()));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(sqlx::Error::Protocol(format!("unexpected row shape: {other}"))),
        })
        .collect()
}

#[async_trait]
impl QueryStore for PgQueryStore {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, sqlx::Error> {
        let wrapped = wrap_for_json(sql);
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let timeout = format!("SET LOCAL statement_timeout = {}", self.statement_timeout_ms);
        sqlx::query(&timeout).execute(&mut *tx).await?;

        let value: Value = sqlx::query_scalar(&wrapped).fetch_one(&mut *tx).await?;
        tx.rollback().await?;

        into_rows(value)
    }
}

async fn lookup(
    pool: &PgPool,
    sql: &str,
    ids: &[i64],
) -> Result<HashMap<i64, String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = sqlx::query_as(sql).bind(ids).fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

#[async_trait]
impl NameResolver for PgQueryStore {
    async fn user_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
        lookup(
            &self.pool,
            "SELECT user_id::bigint, full_name FROM users WHERE user_id = ANY($1)",
            ids,
        )
        .await
    }

    async fn property_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
        lookup(
            &self.pool,
            "SELECT property_id::bigint, property_name FROM properties WHERE property_id = ANY($1)",
            ids,
        )
        .await
    }

    async fn room_labels(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
        lookup(
            &self.pool,
            r#"
            SELECT r.room_id::bigint, p.property_name || ' - ' || r.room_type::text
            FROM rooms r
            JOIN properties p ON r.property_id = p.property_id
            WHERE r.room_id = ANY($1)
            "#,
            ids,
        )
        .await
    }
}
