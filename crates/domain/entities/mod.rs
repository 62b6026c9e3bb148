pub mod bookings;
pub mod payments;
pub mod sports_complexes;
pub mod sports_fields;
