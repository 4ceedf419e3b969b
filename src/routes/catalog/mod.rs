mod handler;
mod model;

pub use handler::{
    get_property, list_properties, property_amenities, property_images, property_rooms,
    room_images,
};
pub use model::{PROPERTY_COLUMNS, Property, ROOM_COLUMNS, Room};
