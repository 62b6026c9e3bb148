use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    RunQueryDsl, insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{bookings, payments},
};
use domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    repositories::payments::PaymentRepository,
    value_objects::{enums::payment_statuses::PaymentStatus, payments::PaymentInsertOutcome},
};

pub const PAYMENT_BOOKING_CONSTRAINT: &str = "payments_booking_id_key";

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn insert(&self, payment: InsertPaymentEntity) -> Result<PaymentInsertOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payments::table)
            .values(&payment)
            .returning(PaymentEntity::as_returning())
            .get_result::<PaymentEntity>(&mut conn);

        match result {
            Ok(row) => Ok(PaymentInsertOutcome::Inserted(row)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                if info.constraint_name() == Some(PAYMENT_BOOKING_CONSTRAINT) =>
            {
                Ok(PaymentInsertOutcome::DuplicateBooking)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .find(payment_id)
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::booking_id.eq(booking_id))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payments::table
            .inner_join(bookings::table)
            .filter(bookings::user_id.eq(user_id))
            .select(PaymentEntity::as_select())
            .order(payments::created_at.desc())
            .load::<PaymentEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_paid(&self, payment_id: Uuid) -> Result<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Conditional on PENDING so the status can never move backwards.
        let updated = update(payments::table)
            .filter(payments::id.eq(payment_id))
            .filter(payments::status.eq(PaymentStatus::Pending.as_str()))
            .set((
                payments::status.eq(PaymentStatus::Paid.as_str()),
                payments::updated_at.eq(Utc::now()),
            ))
            .returning(PaymentEntity::as_returning())
            .get_result::<PaymentEntity>(&mut conn)
            .optional()?;

        match updated {
            Some(row) => Ok(row),
            None => {
                let current = payments::table
                    .find(payment_id)
                    .select(PaymentEntity::as_select())
                    .first::<PaymentEntity>(&mut conn)?;
                Ok(current)
            }
        }
    }

    async fn replace_session(
        &self,
        payment_id: Uuid,
        expected_session_id: String,
        session_id: String,
        session_url: String,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(payments::table)
            .filter(payments::id.eq(payment_id))
            .filter(payments::status.eq(PaymentStatus::Pending.as_str()))
            .filter(payments::session_id.eq(expected_session_id))
            .set((
                payments::session_id.eq(session_id),
                payments::session_url.eq(session_url),
                payments::updated_at.eq(Utc::now()),
            ))
            .returning(PaymentEntity::as_returning())
            .get_result::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(updated)
    }
}
