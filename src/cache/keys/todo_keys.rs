const OWNER_TODOS_PREFIX: &str = "todos:owner:";

/// Hash of to-do id to to-do JSON for one owner.
pub fn owner_todos_key(owner_id: i64) -> String {
    format!("{OWNER_TODOS_PREFIX}{owner_id}")
}
