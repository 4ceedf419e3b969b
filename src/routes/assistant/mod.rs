mod handler;
mod model;

pub use handler::{chat, run_query, schema};
pub use model::{ChatRequest, QueryRequest};
