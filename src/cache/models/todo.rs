use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedTodo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub completed: bool,
    pub created_at: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
}

impl CachedTodo {
    pub fn apply(&mut self, changes: TodoChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_given_fields() {
        let mut todo = CachedTodo {
            id: 1,
            title: "Fix sink".into(),
            description: "Room 2".into(),
            priority: "medium".into(),
            completed: false,
            created_at: "2025-01-01T00:00:00".into(),
        };
        todo.apply(TodoChanges {
            completed: Some(true),
            ..Default::default()
        });
        assert!(todo.completed);
        assert_eq!(todo.title, "Fix sink");
        assert_eq!(todo.priority, "medium");
    }
}
