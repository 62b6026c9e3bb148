use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::{enums::payment_statuses::PaymentStatus, money::as_decimal_string},
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
}

/// What the gateway needs to open a checkout session for one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub amount_minor: i32,
    pub description: String,
    /// Sent as `Idempotency-Key`. Must differ per remote session.
    pub idempotency_key: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Opaque identifiers handed back by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    pub id: String,
    pub url: String,
}

/// Lifecycle of a remote checkout session as far as payment is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewaySessionState {
    /// Still payable, or paid with funds not settled yet.
    Open,
    Paid,
    /// Can never be paid; a new session is needed.
    Expired,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: PaymentStatus,
    pub session_id: String,
    pub session_url: String,
    #[serde(serialize_with = "as_decimal_string::serialize")]
    pub money_to_pay: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentDto {
    fn from(value: PaymentEntity) -> Self {
        Self {
            id: value.id,
            booking_id: value.booking_id,
            // The column is CHECK-constrained, anything else is treated as unpaid.
            status: PaymentStatus::from_str(&value.status).unwrap_or(PaymentStatus::Pending),
            session_id: value.session_id,
            session_url: value.session_url,
            money_to_pay: value.money_to_pay_minor,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentMessageDto {
    pub message: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentInsertOutcome {
    Inserted(PaymentEntity),
    /// `payments_booking_id_key` rejected the row: the booking already has a payment.
    DuplicateBooking,
}
