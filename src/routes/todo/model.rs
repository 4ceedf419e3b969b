use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CachedTodo;

pub const DEFAULT_PRIORITY: &str = "medium";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
}

impl CreateTodoRequest {
    /// New, incomplete to-do whose id is its creation time in milliseconds.
    pub fn into_todo(self, now: DateTime<Utc>) -> CachedTodo {
        CachedTodo {
            id: now.timestamp_millis(),
            title: self.title,
            description: self.description,
            priority: self.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            completed: false,
            created_at: now.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_todo_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let todo = CreateTodoRequest {
            title: "Inspect roof".into(),
            ..Default::default()
        }
        .into_todo(now);

        assert_eq!(todo.id, now.timestamp_millis());
        assert_eq!(todo.priority, "medium");
        assert!(!todo.completed);
        assert_eq!(todo.created_at, "2025-03-01T09:30:00.000000");
    }
}
