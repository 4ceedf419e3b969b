mod handler;
mod model;

pub use handler::{active_booking, create_booking};
pub use model::{BOOKING_COLUMNS, Booking};
