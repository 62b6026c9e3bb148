use std::{collections::HashSet, sync::Arc};

use crates::domain::{
    repositories::{bookings::BookingRepository, catalog::CatalogRepository},
    value_objects::{
        bookings::{BatchInsertOutcome, BookingDto, ScheduleEntryDto},
        time_slots::{InvalidTimeSlot, TimeSlot, validate_slot_time},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("at least one slot is required")]
    EmptyRequest,
    #[error(transparent)]
    InvalidTimeSlot(#[from] InvalidTimeSlot),
    #[error("slots already booked: {}", describe_slots(.0))]
    SlotConflict(Vec<TimeSlot>),
    #[error("field {0} not found")]
    FieldNotFound(Uuid),
    #[error("booking {0} not found")]
    BookingNotFound(Uuid),
    #[error("booking {0} belongs to another user")]
    Forbidden(Uuid),
    #[error("user {0} is not registered")]
    UnknownUser(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::EmptyRequest | BookingError::InvalidTimeSlot(_) => StatusCode::BAD_REQUEST,
            BookingError::SlotConflict(_) => StatusCode::CONFLICT,
            BookingError::FieldNotFound(_) | BookingError::BookingNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::UnknownUser(_) => StatusCode::UNAUTHORIZED,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn describe_slots(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .map(|slot| format!("{} {}", slot.day, slot.time.format("%H:%M")))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

/// The booking ledger: the only writer of bookings.
pub struct BookingUseCase<B, C>
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    catalog_repo: Arc<C>,
}

impl<B, C> BookingUseCase<B, C>
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(booking_repo: Arc<B>, catalog_repo: Arc<C>) -> Self {
        Self {
            booking_repo,
            catalog_repo,
        }
    }

    /// Books every slot or none. Checks run in order: slot validation,
    /// duplicates within the request, field existence, existing bookings, and
    /// finally the transactional insert guarded by the unique constraint.
    pub async fn book_slots(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        slots: Vec<TimeSlot>,
    ) -> UseCaseResult<Vec<BookingDto>> {
        info!(
            %user_id,
            %field_id,
            slot_count = slots.len(),
            "bookings: batch booking requested"
        );

        if slots.is_empty() {
            let err = BookingError::EmptyRequest;
            warn!(
                %user_id,
                %field_id,
                status = err.status_code().as_u16(),
                "bookings: empty slot list"
            );
            return Err(err);
        }

        for slot in &slots {
            validate_slot_time(slot.time).map_err(|invalid| {
                let err = BookingError::from(invalid);
                warn!(
                    %user_id,
                    %field_id,
                    day = %slot.day,
                    time = %slot.time,
                    status = err.status_code().as_u16(),
                    "bookings: slot outside operating window"
                );
                err
            })?;
        }

        let mut seen = HashSet::with_capacity(slots.len());
        let duplicates: Vec<TimeSlot> = slots
            .iter()
            .filter(|slot| !seen.insert(**slot))
            .copied()
            .collect();
        if !duplicates.is_empty() {
            let err = BookingError::SlotConflict(duplicates);
            warn!(
                %user_id,
                %field_id,
                status = err.status_code().as_u16(),
                "bookings: slot requested twice in one batch"
            );
            return Err(err);
        }

        let field = self
            .catalog_repo
            .find_field(field_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %field_id,
                    db_error = ?err,
                    "bookings: failed to load field"
                );
                BookingError::Internal(err)
            })?;
        if field.is_none() {
            let err = BookingError::FieldNotFound(field_id);
            warn!(
                %user_id,
                %field_id,
                status = err.status_code().as_u16(),
                "bookings: field not found"
            );
            return Err(err);
        }

        let taken = self
            .booking_repo
            .find_booked_slots(field_id, slots.clone())
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %field_id,
                    db_error = ?err,
                    "bookings: failed to check existing bookings"
                );
                BookingError::Internal(err)
            })?;
        if !taken.is_empty() {
            let err = BookingError::SlotConflict(taken);
            warn!(
                %user_id,
                %field_id,
                status = err.status_code().as_u16(),
                error = %err,
                "bookings: requested slots already booked"
            );
            return Err(err);
        }

        let outcome = self
            .booking_repo
            .insert_batch(field_id, user_id, slots)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %field_id,
                    db_error = ?err,
                    "bookings: batch insert failed"
                );
                BookingError::Internal(err)
            })?;

        match outcome {
            BatchInsertOutcome::Created(rows) => {
                info!(
                    %user_id,
                    %field_id,
                    created = rows.len(),
                    "bookings: batch committed"
                );
                Ok(rows.into_iter().map(BookingDto::from).collect())
            }
            BatchInsertOutcome::Conflict(taken) => {
                let err = BookingError::SlotConflict(taken);
                warn!(
                    %user_id,
                    %field_id,
                    status = err.status_code().as_u16(),
                    error = %err,
                    "bookings: lost race for a slot, nothing written"
                );
                Err(err)
            }
            BatchInsertOutcome::UnknownUser => {
                let err = BookingError::UnknownUser(user_id);
                warn!(
                    %user_id,
                    %field_id,
                    status = err.status_code().as_u16(),
                    "bookings: token subject has no user record"
                );
                Err(err)
            }
            BatchInsertOutcome::UnknownField => Err(BookingError::FieldNotFound(field_id)),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> UseCaseResult<Vec<BookingDto>> {
        let bookings = self
            .booking_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "bookings: failed to list user bookings");
                BookingError::Internal(err)
            })?;

        Ok(bookings.into_iter().map(BookingDto::from).collect())
    }

    pub async fn get_for_user(&self, user_id: Uuid, booking_id: Uuid) -> UseCaseResult<BookingDto> {
        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%user_id, %booking_id, db_error = ?err, "bookings: failed to load booking");
                BookingError::Internal(err)
            })?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.user_id != user_id {
            let err = BookingError::Forbidden(booking_id);
            warn!(
                %user_id,
                %booking_id,
                status = err.status_code().as_u16(),
                "bookings: booking owned by another user"
            );
            return Err(err);
        }

        Ok(booking.into())
    }

    pub async fn field_schedule(&self, field_id: Uuid) -> UseCaseResult<Vec<ScheduleEntryDto>> {
        let field = self.catalog_repo.find_field(field_id).await.map_err(|err| {
            error!(%field_id, db_error = ?err, "bookings: failed to load field for schedule");
            BookingError::Internal(err)
        })?;
        if field.is_none() {
            return Err(BookingError::FieldNotFound(field_id));
        }

        let bookings = self
            .booking_repo
            .list_by_field(field_id)
            .await
            .map_err(|err| {
                error!(%field_id, db_error = ?err, "bookings: failed to load field schedule");
                BookingError::Internal(err)
            })?;

        Ok(bookings.into_iter().map(ScheduleEntryDto::from).collect())
    }
}
