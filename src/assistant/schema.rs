/// Tables and columns the assistant is allowed to reason about, in the compact
/// `table(col, ...)` form handed to the model as grounding context.
pub const SCHEMA_DESCRIPTOR: &str = "\
users(user_id, full_name, email, phone_number, role, date_registered)
properties(property_id, owner_id, property_name, description, location, available_rooms, date_posted)
rooms(room_id, property_id, room_type, available_tenants, monthly_rate, description, total_tenants, current_tenants, house_rules)
bookings(booking_id, tenant_id, room_id, start_date, end_date, status, created_at)
payments(payment_id, booking_id, tenant_id, room_id, amount_paid, payment_date, payment_method, status)
reviews(review_id, tenant_id, room_id, rating, comment, date_posted)";

pub fn schema_descriptor() -> &'static str {
    SCHEMA_DESCRIPTOR
}
