pub mod bookings;
pub mod facilities;
pub mod fields;
pub mod payments;
