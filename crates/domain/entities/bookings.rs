use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::bookings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub field_id: Uuid,
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub field_id: Uuid,
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub time: NaiveTime,
}

/// Projection used by the availability search; carries no user data.
#[derive(Debug, Clone, Copy, Selectable, Queryable, PartialEq, Eq)]
#[diesel(table_name = bookings)]
pub struct BookedSlotEntity {
    pub field_id: Uuid,
    pub day: NaiveDate,
    pub time: NaiveTime,
}
