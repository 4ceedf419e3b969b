// Redis-backed state shared across server processes: login sessions and
// owner to-do lists.

pub mod keys;
pub mod models;
pub mod operations;

pub use models::{CachedSession, CachedTodo};
pub use operations::{SessionCacheOperations, TodoCacheOperations};
