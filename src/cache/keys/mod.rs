// Redis key builders.
pub mod session_keys;
pub mod todo_keys;

pub use session_keys::session_key;
pub use todo_keys::owner_todos_key;
