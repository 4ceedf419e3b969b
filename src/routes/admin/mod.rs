mod handler;
mod model;

pub use handler::{
    approve_property, approve_role_change, approve_user, pending_properties, pending_users,
    reject_property, reject_role_change, reject_user, role_change_requests,
};
