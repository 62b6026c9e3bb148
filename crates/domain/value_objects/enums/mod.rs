pub mod activities;
pub mod payment_statuses;
