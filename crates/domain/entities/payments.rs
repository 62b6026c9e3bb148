use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payments;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: String,
    pub session_id: String,
    pub session_url: String,
    pub money_to_pay_minor: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The id is generated by the caller before the gateway session exists so the
/// redirect URLs can reference it.
#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: String,
    pub session_id: String,
    pub session_url: String,
    pub money_to_pay_minor: i32,
}
