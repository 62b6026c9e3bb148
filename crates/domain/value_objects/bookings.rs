use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::time_slots::{TimeSlot, hour_minute},
};

/// Request body of `POST /fields/{id}/booking`.
pub type CreateBookingRequest = Vec<TimeSlot>;

/// Result of the transactional batch insert.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInsertOutcome {
    /// Rows in the same order as the requested slots.
    Created(Vec<BookingEntity>),
    /// Nothing was written; these slots were already taken.
    Conflict(Vec<TimeSlot>),
    /// The caller has no `app_users` row.
    UnknownUser,
    /// The field was deleted while the batch was being written.
    UnknownField,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingDto {
    pub id: Uuid,
    pub field_id: Uuid,
    pub day: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        Self {
            id: value.id,
            field_id: value.field_id,
            day: value.day,
            time: value.time,
            created_at: value.created_at,
        }
    }
}

/// Public schedule row; deliberately omits who booked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleEntryDto {
    pub id: Uuid,
    pub day: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
}

impl From<BookingEntity> for ScheduleEntryDto {
    fn from(value: BookingEntity) -> Self {
        Self {
            id: value.id,
            day: value.day,
            time: value.time,
        }
    }
}
