pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod enums;
pub mod money;
pub mod payments;
pub mod time_slots;
