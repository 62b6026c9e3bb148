use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    value_objects::payments::PaymentInsertOutcome,
};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    async fn insert(&self, payment: InsertPaymentEntity) -> Result<PaymentInsertOutcome>;
    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>>;
    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Option<PaymentEntity>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>>;
    /// PENDING -> PAID. Returns the row as stored afterwards; a row that is
    /// already PAID is returned untouched.
    async fn mark_paid(&self, payment_id: Uuid) -> Result<PaymentEntity>;
    /// Points a PENDING payment at a new checkout session, only while it still
    /// references `expected_session_id`. `None` when the row moved on.
    async fn replace_session(
        &self,
        payment_id: Uuid,
        expected_session_id: String,
        session_id: String,
        session_url: String,
    ) -> Result<Option<PaymentEntity>>;
}
