pub mod session;
pub mod todo;

pub use session::CachedSession;
pub use todo::CachedTodo;
