// Redis reads and writes for cached models.
pub mod session;
pub mod todo;

pub use session::SessionCacheOperations;
pub use todo::TodoCacheOperations;
