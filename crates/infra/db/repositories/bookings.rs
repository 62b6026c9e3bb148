use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use diesel::{
    Connection, PgConnection, RunQueryDsl,
    insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use tracing::warn;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings};
use domain::{
    entities::bookings::{BookedSlotEntity, BookingEntity, InsertBookingEntity},
    repositories::bookings::BookingRepository,
    value_objects::{
        availability::BookedSlotQuery, bookings::BatchInsertOutcome, time_slots::TimeSlot,
    },
};

pub const BOOKING_SLOT_CONSTRAINT: &str = "bookings_field_day_time_key";
pub const BOOKING_USER_CONSTRAINT: &str = "bookings_user_id_fkey";
pub const BOOKING_FIELD_CONSTRAINT: &str = "bookings_field_id_fkey";

fn foreign_key_outcome(constraint: Option<&str>) -> Option<BatchInsertOutcome> {
    match constraint {
        Some(BOOKING_USER_CONSTRAINT) => Some(BatchInsertOutcome::UnknownUser),
        Some(BOOKING_FIELD_CONSTRAINT) => Some(BatchInsertOutcome::UnknownField),
        _ => None,
    }
}

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn taken_slots(
        conn: &mut PgConnection,
        field_id: Uuid,
        slots: &[TimeSlot],
    ) -> QueryResult<Vec<TimeSlot>> {
        let days: Vec<NaiveDate> = slots.iter().map(|slot| slot.day).collect();
        let times: Vec<NaiveTime> = slots.iter().map(|slot| slot.time).collect();

        // Coarse filter in SQL, exact (day, time) pairing below.
        let existing: HashSet<TimeSlot> = bookings::table
            .filter(bookings::field_id.eq(field_id))
            .filter(bookings::day.eq_any(days))
            .filter(bookings::time.eq_any(times))
            .select((bookings::day, bookings::time))
            .load::<(NaiveDate, NaiveTime)>(conn)?
            .into_iter()
            .map(|(day, time)| TimeSlot::new(day, time))
            .collect();

        Ok(slots
            .iter()
            .filter(|slot| existing.contains(slot))
            .copied()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn find_booked_slots(
        &self,
        field_id: Uuid,
        slots: Vec<TimeSlot>,
    ) -> Result<Vec<TimeSlot>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let taken = Self::taken_slots(&mut conn, field_id, &slots)?;

        Ok(taken)
    }

    async fn insert_batch(
        &self,
        field_id: Uuid,
        user_id: Uuid,
        slots: Vec<TimeSlot>,
    ) -> Result<BatchInsertOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<BatchInsertOutcome, DieselError, _>(|tx| {
            let taken = Self::taken_slots(tx, field_id, &slots)?;
            if !taken.is_empty() {
                return Ok(BatchInsertOutcome::Conflict(taken));
            }

            let mut created = Vec::with_capacity(slots.len());
            for slot in &slots {
                let row = insert_into(bookings::table)
                    .values(&InsertBookingEntity {
                        field_id,
                        user_id,
                        day: slot.day,
                        time: slot.time,
                    })
                    .returning(BookingEntity::as_returning())
                    .get_result::<BookingEntity>(tx)?;
                created.push(row);
            }

            Ok(BatchInsertOutcome::Created(created))
        });

        match result {
            Ok(outcome) => Ok(outcome),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                if info.constraint_name() == Some(BOOKING_SLOT_CONSTRAINT) =>
            {
                warn!(
                    %field_id,
                    %user_id,
                    constraint = BOOKING_SLOT_CONSTRAINT,
                    "bookings: concurrent writer claimed a requested slot"
                );
                // The transaction is rolled back; look again to name the winners.
                let taken = Self::taken_slots(&mut conn, field_id, &slots)?;
                if taken.is_empty() {
                    Ok(BatchInsertOutcome::Conflict(slots))
                } else {
                    Ok(BatchInsertOutcome::Conflict(taken))
                }
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)) => {
                match foreign_key_outcome(info.constraint_name()) {
                    Some(outcome) => {
                        warn!(
                            %field_id,
                            %user_id,
                            constraint = ?info.constraint_name(),
                            "bookings: referenced row missing, nothing written"
                        );
                        Ok(outcome)
                    }
                    None => Err(DieselError::DatabaseError(
                        DatabaseErrorKind::ForeignKeyViolation,
                        info,
                    )
                    .into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = bookings::table
            .find(booking_id)
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::user_id.eq(user_id))
            .select(BookingEntity::as_select())
            .order((bookings::day.asc(), bookings::time.asc()))
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_field(&self, field_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::field_id.eq(field_id))
            .select(BookingEntity::as_select())
            .order((bookings::day.asc(), bookings::time.asc()))
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_booked_slots(&self, bounds: BookedSlotQuery) -> Result<Vec<BookedSlotEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let mut query = bookings::table
            .select(BookedSlotEntity::as_select())
            .into_boxed();

        if let Some(day) = bounds.day {
            query = query.filter(bookings::day.eq(day));
        }
        if let Some(first_day) = bounds.not_before {
            query = query.filter(bookings::day.ge(first_day));
        }
        if let Some(after) = bounds.starts_after {
            query = query.filter(bookings::time.gt(after));
        }
        if let Some(last) = bounds.starts_at_or_before {
            query = query.filter(bookings::time.le(last));
        }

        let results = query.load::<BookedSlotEntity>(&mut conn)?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_or_field_maps_to_outcome() {
        assert_eq!(
            foreign_key_outcome(Some("bookings_user_id_fkey")),
            Some(BatchInsertOutcome::UnknownUser)
        );
        assert_eq!(
            foreign_key_outcome(Some("bookings_field_id_fkey")),
            Some(BatchInsertOutcome::UnknownField)
        );
        assert_eq!(foreign_key_outcome(Some("payments_booking_id_fkey")), None);
        assert_eq!(foreign_key_outcome(None), None);
    }
}
