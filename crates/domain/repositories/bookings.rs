use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::bookings::{BookedSlotEntity, BookingEntity},
    value_objects::{
        availability::BookedSlotQuery, bookings::BatchInsertOutcome, time_slots::TimeSlot,
    },
};

#[automock]
#[async_trait]
pub trait BookingRepository {
    /// Strict-mode lookup: the subset of `slots` already booked on `field_id`,
    /// in request order.
    async fn find_booked_slots(&self, field_id: Uuid, slots: Vec<TimeSlot>)
    -> Result<Vec<TimeSlot>>;
    /// Inserts every slot in one transaction or none of them. Losing a race on
    /// the `(field_id, day, time)` constraint yields `Conflict`, not an error.
    async fn insert_batch(
        &self,
        field_id: Uuid,
        user_id: Uuid,
        slots: Vec<TimeSlot>,
    ) -> Result<BatchInsertOutcome>;
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<BookingEntity>>;
    async fn list_by_field(&self, field_id: Uuid) -> Result<Vec<BookingEntity>>;
    async fn list_booked_slots(&self, query: BookedSlotQuery) -> Result<Vec<BookedSlotEntity>>;
}
