mod handler;
mod model;

pub use handler::{
    add_room, bookings, create_property, pending_properties, properties, tenant_chat, tenants,
    update_booking_status,
};
pub use model::{BOOKING_STATUSES, TenantSummary};
