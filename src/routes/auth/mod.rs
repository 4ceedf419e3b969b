mod handler;
mod model;

pub use handler::{login, logout, register, request_role_change, user_profile, user_status};
pub use model::{SessionUser, USER_PROFILE_COLUMNS, UserProfile};
