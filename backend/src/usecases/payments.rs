use std::sync::Arc;

use anyhow::{Result as AnyResult, anyhow};
use async_trait::async_trait;
use crates::{
    domain::{
        entities::{
            bookings::BookingEntity,
            payments::{InsertPaymentEntity, PaymentEntity},
            sports_fields::SportsFieldEntity,
        },
        repositories::{
            bookings::BookingRepository, catalog::CatalogRepository, payments::PaymentRepository,
        },
        value_objects::{
            enums::payment_statuses::PaymentStatus,
            payments::{
                CheckoutRequest, GatewaySession, GatewaySessionState, PaymentDto,
                PaymentInsertOutcome, PaymentMessageDto,
            },
        },
    },
    payments::stripe_client::StripeClient,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The slice of the payment provider the payment flow depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AnyResult<GatewaySession>;
    async fn session_state(&self, session_id: &str) -> AnyResult<GatewaySessionState>;
    async fn expire_session(&self, session_id: &str) -> AnyResult<()>;
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AnyResult<GatewaySession> {
        StripeClient::create_checkout_session(self, request).await
    }

    async fn session_state(&self, session_id: &str) -> AnyResult<GatewaySessionState> {
        let session = self.retrieve_checkout_session(session_id).await?;
        Ok(session.state())
    }

    async fn expire_session(&self, session_id: &str) -> AnyResult<()> {
        self.expire_checkout_session(session_id).await
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("booking {0} not found")]
    BookingNotFound(Uuid),
    #[error("payment {0} not found")]
    PaymentNotFound(Uuid),
    #[error("resource {0} belongs to another user")]
    Forbidden(Uuid),
    #[error("booking {0} is already paid")]
    AlreadyPaid(Uuid),
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::BookingNotFound(_) | PaymentError::PaymentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PaymentError::Forbidden(_) => StatusCode::FORBIDDEN,
            PaymentError::AlreadyPaid(_) => StatusCode::CONFLICT,
            PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

const PAID_MESSAGE: &str = "Payment success";
const UNPAID_MESSAGE: &str = "Payment wasn't paid";
const CANCELED_MESSAGE: &str = "Payment canceled";

pub struct PaymentUseCase<P, B, C, G>
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    payment_repo: Arc<P>,
    booking_repo: Arc<B>,
    catalog_repo: Arc<C>,
    gateway: Arc<G>,
    public_base_url: String,
}

impl<P, B, C, G> PaymentUseCase<P, B, C, G>
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<P>,
        booking_repo: Arc<B>,
        catalog_repo: Arc<C>,
        gateway: Arc<G>,
        public_base_url: String,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            catalog_repo,
            gateway,
            public_base_url,
        }
    }

    /// Opens a checkout session for one of the caller's bookings. A booking has
    /// at most one payment: a pending one is handed back while its session is
    /// still payable, re-pointed at a fresh session once the old one expired,
    /// and a paid one is rejected.
    pub async fn initiate(&self, user_id: Uuid, booking_id: Uuid) -> PaymentResult<PaymentDto> {
        info!(%user_id, %booking_id, "payments: initiate requested");

        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to load booking");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::BookingNotFound(booking_id))?;

        if booking.user_id != user_id {
            let err = PaymentError::Forbidden(booking_id);
            warn!(
                %user_id,
                %booking_id,
                status = err.status_code().as_u16(),
                "payments: booking owned by another user"
            );
            return Err(err);
        }

        let field = self
            .catalog_repo
            .find_field(booking.field_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to load field");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| anyhow!("field {} of booking {} is missing", booking.field_id, booking_id))?;

        if let Some(existing) = self.find_existing(booking_id).await? {
            return self.resume_existing(existing, &booking, &field).await;
        }

        let payment_id = Uuid::new_v4();
        let request = self.checkout_request(
            payment_id,
            &booking,
            &field,
            field.price_minor,
            payment_id.to_string(),
        );

        let session = self.open_session(&request).await?;

        let inserted = self
            .payment_repo
            .insert(InsertPaymentEntity {
                id: payment_id,
                booking_id,
                status: PaymentStatus::Pending.as_str().to_string(),
                session_id: session.id.clone(),
                session_url: session.url.clone(),
                money_to_pay_minor: field.price_minor,
            })
            .await;

        match inserted {
            Ok(PaymentInsertOutcome::Inserted(payment)) => {
                info!(
                    %payment_id,
                    %booking_id,
                    session_id = %payment.session_id,
                    "payments: checkout session opened"
                );
                Ok(payment.into())
            }
            Ok(PaymentInsertOutcome::DuplicateBooking) => {
                warn!(
                    %payment_id,
                    %booking_id,
                    "payments: concurrent initiate won, discarding new session"
                );
                self.expire_orphan_session(&session.id).await;
                let existing = self
                    .find_existing(booking_id)
                    .await?
                    .ok_or_else(|| anyhow!("payment for booking {booking_id} vanished"))?;
                Self::reuse_existing(existing)
            }
            Err(err) => {
                error!(
                    %payment_id,
                    %booking_id,
                    db_error = ?err,
                    "payments: failed to store payment"
                );
                self.expire_orphan_session(&session.id).await;
                Err(PaymentError::Internal(err))
            }
        }
    }

    /// Polls the gateway unless the payment is already PAID.
    pub async fn confirm(&self, user_id: Uuid, payment_id: Uuid) -> PaymentResult<PaymentMessageDto> {
        let payment = self.load_owned(user_id, payment_id).await?;

        if payment.status == PaymentStatus::Paid.as_str() {
            info!(%payment_id, "payments: already paid, skipping gateway");
            return Ok(PaymentMessageDto {
                message: PAID_MESSAGE.to_string(),
                status: PaymentStatus::Paid,
            });
        }

        let state = self.remote_state(&payment).await?;

        if state != GatewaySessionState::Paid {
            info!(%payment_id, session_state = ?state, "payments: session not paid yet");
            return Ok(PaymentMessageDto {
                message: UNPAID_MESSAGE.to_string(),
                status: PaymentStatus::Pending,
            });
        }

        let updated = self.payment_repo.mark_paid(payment_id).await.map_err(|err| {
            error!(%payment_id, db_error = ?err, "payments: failed to mark payment paid");
            PaymentError::Internal(err)
        })?;
        info!(%payment_id, booking_id = %updated.booking_id, "payments: payment confirmed");

        Ok(PaymentMessageDto {
            message: PAID_MESSAGE.to_string(),
            status: PaymentStatus::from_str(&updated.status).unwrap_or(PaymentStatus::Paid),
        })
    }

    /// Acknowledges an abandoned checkout. The payment is left untouched.
    pub async fn cancel(&self, user_id: Uuid, payment_id: Uuid) -> PaymentResult<PaymentMessageDto> {
        let payment = self.load_owned(user_id, payment_id).await?;
        info!(%payment_id, "payments: checkout canceled by user");

        Ok(PaymentMessageDto {
            message: CANCELED_MESSAGE.to_string(),
            status: PaymentStatus::from_str(&payment.status).unwrap_or(PaymentStatus::Pending),
        })
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> PaymentResult<Vec<PaymentDto>> {
        let payments = self.payment_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "payments: failed to list payments");
            PaymentError::Internal(err)
        })?;

        Ok(payments.into_iter().map(PaymentDto::from).collect())
    }

    pub async fn get_for_user(&self, user_id: Uuid, payment_id: Uuid) -> PaymentResult<PaymentDto> {
        Ok(self.load_owned(user_id, payment_id).await?.into())
    }

    fn checkout_request(
        &self,
        payment_id: Uuid,
        booking: &BookingEntity,
        field: &SportsFieldEntity,
        amount_minor: i32,
        idempotency_key: String,
    ) -> CheckoutRequest {
        CheckoutRequest {
            payment_id,
            booking_id: booking.id,
            amount_minor,
            description: format!(
                "{} {} {}",
                field.activity,
                booking.day,
                booking.time.format("%H:%M")
            ),
            success_url: format!("{}/api/v1/payments/{payment_id}/success", self.public_base_url),
            cancel_url: format!("{}/api/v1/payments/{payment_id}/cancel", self.public_base_url),
            idempotency_key,
        }
    }

    async fn open_session(&self, request: &CheckoutRequest) -> PaymentResult<GatewaySession> {
        self.gateway
            .create_checkout_session(request)
            .await
            .map_err(|err| {
                error!(
                    payment_id = %request.payment_id,
                    booking_id = %request.booking_id,
                    gateway_error = ?err,
                    "payments: failed to create checkout session"
                );
                PaymentError::Gateway(err.to_string())
            })
    }

    async fn remote_state(&self, payment: &PaymentEntity) -> PaymentResult<GatewaySessionState> {
        self.gateway
            .session_state(&payment.session_id)
            .await
            .map_err(|err| {
                error!(
                    payment_id = %payment.id,
                    session_id = %payment.session_id,
                    gateway_error = ?err,
                    "payments: failed to retrieve checkout session"
                );
                PaymentError::Gateway(err.to_string())
            })
    }

    /// Handles re-initiation of a booking that already has a payment.
    async fn resume_existing(
        &self,
        existing: PaymentEntity,
        booking: &BookingEntity,
        field: &SportsFieldEntity,
    ) -> PaymentResult<PaymentDto> {
        if existing.status == PaymentStatus::Paid.as_str() {
            return Self::reuse_existing(existing);
        }

        match self.remote_state(&existing).await? {
            GatewaySessionState::Open => Self::reuse_existing(existing),
            GatewaySessionState::Paid => {
                let updated = self.payment_repo.mark_paid(existing.id).await.map_err(|err| {
                    error!(payment_id = %existing.id, db_error = ?err, "payments: failed to mark payment paid");
                    PaymentError::Internal(err)
                })?;
                info!(payment_id = %updated.id, "payments: payment found paid on re-initiate");
                Self::reuse_existing(updated)
            }
            GatewaySessionState::Expired => self.renew_session(existing, booking, field).await,
        }
    }

    /// Opens a new session for a PENDING payment whose session expired. The
    /// amount stays the one recorded on the payment.
    async fn renew_session(
        &self,
        existing: PaymentEntity,
        booking: &BookingEntity,
        field: &SportsFieldEntity,
    ) -> PaymentResult<PaymentDto> {
        let payment_id = existing.id;
        info!(
            %payment_id,
            expired_session_id = %existing.session_id,
            "payments: checkout session expired, opening a new one"
        );

        // Keyed on the expired session so concurrent renewals share one session.
        let request = self.checkout_request(
            payment_id,
            booking,
            field,
            existing.money_to_pay_minor,
            format!("{payment_id}:{}", existing.session_id),
        );
        let session = self.open_session(&request).await?;

        let replaced = self
            .payment_repo
            .replace_session(
                payment_id,
                existing.session_id.clone(),
                session.id.clone(),
                session.url.clone(),
            )
            .await;

        match replaced {
            Ok(Some(payment)) => {
                info!(
                    %payment_id,
                    session_id = %payment.session_id,
                    "payments: checkout session renewed"
                );
                Ok(payment.into())
            }
            Ok(None) => {
                let current = self
                    .payment_repo
                    .find_by_id(payment_id)
                    .await
                    .map_err(|err| {
                        error!(%payment_id, db_error = ?err, "payments: failed to reload payment");
                        PaymentError::Internal(err)
                    })?
                    .ok_or(PaymentError::PaymentNotFound(payment_id))?;
                if current.session_id != session.id {
                    warn!(%payment_id, "payments: payment changed during renewal, discarding new session");
                    self.expire_orphan_session(&session.id).await;
                }
                Self::reuse_existing(current)
            }
            Err(err) => {
                error!(%payment_id, db_error = ?err, "payments: failed to store renewed session");
                self.expire_orphan_session(&session.id).await;
                Err(PaymentError::Internal(err))
            }
        }
    }

    async fn find_existing(&self, booking_id: Uuid) -> PaymentResult<Option<PaymentEntity>> {
        self.payment_repo
            .find_by_booking_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to look up payment");
                PaymentError::Internal(err)
            })
    }

    fn reuse_existing(existing: PaymentEntity) -> PaymentResult<PaymentDto> {
        if existing.status == PaymentStatus::Paid.as_str() {
            let err = PaymentError::AlreadyPaid(existing.booking_id);
            warn!(
                payment_id = %existing.id,
                booking_id = %existing.booking_id,
                status = err.status_code().as_u16(),
                "payments: booking already paid"
            );
            return Err(err);
        }

        info!(
            payment_id = %existing.id,
            booking_id = %existing.booking_id,
            "payments: reusing pending payment"
        );
        Ok(existing.into())
    }

    async fn load_owned(&self, user_id: Uuid, payment_id: Uuid) -> PaymentResult<PaymentEntity> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to load payment");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        let booking = self
            .booking_repo
            .find_by_id(payment.booking_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payments: failed to load booking");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        if booking.user_id != user_id {
            let err = PaymentError::Forbidden(payment_id);
            warn!(
                %user_id,
                %payment_id,
                status = err.status_code().as_u16(),
                "payments: payment owned by another user"
            );
            return Err(err);
        }

        Ok(payment)
    }

    async fn expire_orphan_session(&self, session_id: &str) {
        if let Err(err) = self.gateway.expire_session(session_id).await {
            error!(
                session_id,
                gateway_error = ?err,
                "payments: failed to expire orphaned checkout session, reconcile manually"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use crates::domain::{
        entities::{bookings::BookingEntity, sports_fields::SportsFieldEntity},
        repositories::{
            bookings::MockBookingRepository, catalog::MockCatalogRepository,
            payments::MockPaymentRepository,
        },
    };
    use mockall::predicate::eq;

    const BASE_URL: &str = "https://book.test";

    fn booking(user_id: Uuid) -> BookingEntity {
        BookingEntity {
            id: Uuid::new_v4(),
            field_id: Uuid::new_v4(),
            user_id,
            day: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn payment(booking_id: Uuid, status: PaymentStatus) -> PaymentEntity {
        PaymentEntity {
            id: Uuid::new_v4(),
            booking_id,
            status: status.as_str().to_string(),
            session_id: "cs_test_existing".to_string(),
            session_url: "https://checkout.test/existing".to_string(),
            money_to_pay_minor: 2000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn booking_repo_with(booking: BookingEntity) -> MockBookingRepository {
        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_find_by_id()
            .with(eq(booking.id))
            .returning(move |_| Ok(Some(booking.clone())));
        booking_repo
    }

    fn catalog_with_price(price_minor: i32) -> MockCatalogRepository {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_find_field().returning(move |id| {
            Ok(Some(SportsFieldEntity {
                id,
                complex_id: Uuid::new_v4(),
                activity: "soccer".to_string(),
                price_minor,
            }))
        });
        catalog_repo
    }

    fn usecase(
        payment_repo: MockPaymentRepository,
        booking_repo: MockBookingRepository,
        catalog_repo: MockCatalogRepository,
        gateway: MockPaymentGateway,
    ) -> PaymentUseCase<
        MockPaymentRepository,
        MockBookingRepository,
        MockCatalogRepository,
        MockPaymentGateway,
    > {
        PaymentUseCase::new(
            Arc::new(payment_repo),
            Arc::new(booking_repo),
            Arc::new(catalog_repo),
            Arc::new(gateway),
            BASE_URL.to_string(),
        )
    }

    #[tokio::test]
    async fn initiate_opens_session_and_stores_pending_payment() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_checkout_session()
            .withf(move |req| {
                req.booking_id == booking_id
                    && req.amount_minor == 2000
                    && req.success_url
                        == format!("{BASE_URL}/api/v1/payments/{}/success", req.payment_id)
                    && req.cancel_url
                        == format!("{BASE_URL}/api/v1/payments/{}/cancel", req.payment_id)
            })
            .times(1)
            .returning(|_| {
                Ok(GatewaySession {
                    id: "cs_test_1".to_string(),
                    url: "https://checkout.test/cs_test_1".to_string(),
                })
            });
        gateway.expect_expire_session().never();

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(|_| Ok(None));
        payment_repo
            .expect_insert()
            .withf(|row| row.status == "PENDING" && row.session_id == "cs_test_1")
            .times(1)
            .returning(|row| {
                Ok(PaymentInsertOutcome::Inserted(PaymentEntity {
                    id: row.id,
                    booking_id: row.booking_id,
                    status: row.status,
                    session_id: row.session_id,
                    session_url: row.session_url,
                    money_to_pay_minor: row.money_to_pay_minor,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            });

        let usecase = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            gateway,
        );
        let dto = usecase.initiate(user_id, booking_id).await.unwrap();

        assert_eq!(dto.booking_id, booking_id);
        assert_eq!(dto.status, PaymentStatus::Pending);
        assert_eq!(dto.money_to_pay, 2000);
        assert_eq!(dto.session_url, "https://checkout.test/cs_test_1");
    }

    #[tokio::test]
    async fn initiate_for_someone_elses_booking_is_forbidden() {
        let booking = booking(Uuid::new_v4());
        let booking_id = booking.id;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout_session().never();

        let usecase = usecase(
            MockPaymentRepository::new(),
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            gateway,
        );
        let err = usecase.initiate(Uuid::new_v4(), booking_id).await.unwrap_err();

        assert!(matches!(err, PaymentError::Forbidden(_)));
    }

    #[tokio::test]
    async fn initiate_reuses_pending_and_rejects_paid() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;
        let pending = payment(booking_id, PaymentStatus::Pending);
        let pending_id = pending.id;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .with(eq("cs_test_existing"))
            .returning(|_| Ok(GatewaySessionState::Open));
        gateway.expect_create_checkout_session().never();
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo.expect_insert().never();
        payment_repo.expect_replace_session().never();

        let reused = usecase(
            payment_repo,
            booking_repo_with(booking.clone()),
            catalog_with_price(2000),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap();
        assert_eq!(reused.id, pending_id);

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(move |id| Ok(Some(payment(id, PaymentStatus::Paid))));
        let err = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            MockPaymentGateway::new(),
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap_err();
        assert!(matches!(err, PaymentError::AlreadyPaid(id) if id == booking_id));
    }

    #[tokio::test]
    async fn expired_session_is_renewed_on_reinitiate() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;
        let stale = PaymentEntity {
            money_to_pay_minor: 1500,
            ..payment(booking_id, PaymentStatus::Pending)
        };
        let payment_id = stale.id;
        let stale_for_repo = stale.clone();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .with(eq("cs_test_existing"))
            .times(1)
            .returning(|_| Ok(GatewaySessionState::Expired));
        gateway
            .expect_create_checkout_session()
            .withf(move |req| {
                req.payment_id == payment_id
                    && req.amount_minor == 1500
                    && req.idempotency_key == format!("{payment_id}:cs_test_existing")
            })
            .times(1)
            .returning(|_| {
                Ok(GatewaySession {
                    id: "cs_test_renewed".to_string(),
                    url: "https://checkout.test/renewed".to_string(),
                })
            });
        gateway.expect_expire_session().never();

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(move |_| Ok(Some(stale_for_repo.clone())));
        payment_repo.expect_insert().never();
        payment_repo
            .expect_replace_session()
            .withf(move |id, expected, new_id, new_url| {
                *id == payment_id
                    && expected == "cs_test_existing"
                    && new_id == "cs_test_renewed"
                    && new_url == "https://checkout.test/renewed"
            })
            .times(1)
            .returning(move |_, _, session_id, session_url| {
                Ok(Some(PaymentEntity {
                    session_id,
                    session_url,
                    ..stale.clone()
                }))
            });

        // Field price changed since; the recorded amount is charged.
        let dto = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(9900),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap();

        assert_eq!(dto.id, payment_id);
        assert_eq!(dto.status, PaymentStatus::Pending);
        assert_eq!(dto.session_url, "https://checkout.test/renewed");
    }

    #[tokio::test]
    async fn reinitiate_after_remote_payment_records_it_and_rejects() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;
        let pending = payment(booking_id, PaymentStatus::Pending);
        let payment_id = pending.id;
        let paid = PaymentEntity {
            status: "PAID".to_string(),
            ..pending.clone()
        };

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .returning(|_| Ok(GatewaySessionState::Paid));
        gateway.expect_create_checkout_session().never();
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo
            .expect_mark_paid()
            .with(eq(payment_id))
            .times(1)
            .returning(move |_| Ok(paid.clone()));

        let err = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap_err();

        assert!(matches!(err, PaymentError::AlreadyPaid(id) if id == booking_id));
    }

    #[tokio::test]
    async fn gateway_failure_stores_nothing() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_checkout_session()
            .returning(|_| Err(anyhow!("connect timeout")));
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(|_| Ok(None));
        payment_repo.expect_insert().never();

        let err = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn storage_failure_expires_the_new_session() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout_session().returning(|_| {
            Ok(GatewaySession {
                id: "cs_test_orphan".to_string(),
                url: "https://checkout.test/orphan".to_string(),
            })
        });
        gateway
            .expect_expire_session()
            .with(eq("cs_test_orphan"))
            .times(1)
            .returning(|_| Ok(()));
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_booking_id()
            .returning(|_| Ok(None));
        payment_repo
            .expect_insert()
            .returning(|_| Err(anyhow!("connection reset")));

        let err = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap_err();

        assert!(matches!(err, PaymentError::Internal(_)));
    }

    #[tokio::test]
    async fn lost_insert_race_returns_winner_and_expires_session() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let booking_id = booking.id;
        let winner = payment(booking_id, PaymentStatus::Pending);
        let winner_id = winner.id;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout_session().returning(|_| {
            Ok(GatewaySession {
                id: "cs_test_loser".to_string(),
                url: "https://checkout.test/loser".to_string(),
            })
        });
        gateway
            .expect_expire_session()
            .with(eq("cs_test_loser"))
            .times(1)
            .returning(|_| Ok(()));

        let mut payment_repo = MockPaymentRepository::new();
        let mut seq = mockall::Sequence::new();
        payment_repo
            .expect_find_by_booking_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        payment_repo
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PaymentInsertOutcome::DuplicateBooking));
        payment_repo
            .expect_find_by_booking_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(winner.clone())));

        let dto = usecase(
            payment_repo,
            booking_repo_with(booking),
            catalog_with_price(2000),
            gateway,
        )
        .initiate(user_id, booking_id)
        .await
        .unwrap();

        assert_eq!(dto.id, winner_id);
    }

    #[tokio::test]
    async fn confirm_marks_paid_once_gateway_reports_paid() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let pending = payment(booking.id, PaymentStatus::Pending);
        let payment_id = pending.id;
        let paid = PaymentEntity {
            status: "PAID".to_string(),
            ..pending.clone()
        };

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .with(eq("cs_test_existing"))
            .times(1)
            .returning(|_| Ok(GatewaySessionState::Paid));
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo
            .expect_mark_paid()
            .with(eq(payment_id))
            .times(1)
            .returning(move |_| Ok(paid.clone()));

        let message = usecase(
            payment_repo,
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            gateway,
        )
        .confirm(user_id, payment_id)
        .await
        .unwrap();

        assert_eq!(message.status, PaymentStatus::Paid);
        assert_eq!(message.message, "Payment success");
    }

    #[tokio::test]
    async fn confirm_on_paid_payment_skips_gateway() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let paid = payment(booking.id, PaymentStatus::Paid);
        let payment_id = paid.id;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_session_state().never();
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(paid.clone())));
        payment_repo.expect_mark_paid().never();

        let usecase = usecase(
            payment_repo,
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            gateway,
        );

        for _ in 0..2 {
            let message = usecase.confirm(user_id, payment_id).await.unwrap();
            assert_eq!(message.status, PaymentStatus::Paid);
        }
    }

    #[tokio::test]
    async fn confirm_unpaid_session_stays_pending() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let pending = payment(booking.id, PaymentStatus::Pending);
        let payment_id = pending.id;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .returning(|_| Ok(GatewaySessionState::Expired));
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo.expect_mark_paid().never();

        let message = usecase(
            payment_repo,
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            gateway,
        )
        .confirm(user_id, payment_id)
        .await
        .unwrap();

        assert_eq!(message.status, PaymentStatus::Pending);
        assert_eq!(message.message, "Payment wasn't paid");
    }

    #[tokio::test]
    async fn confirm_gateway_error_is_bad_gateway() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let pending = payment(booking.id, PaymentStatus::Pending);
        let payment_id = pending.id;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_session_state()
            .returning(|_| Err(anyhow!("503 from provider")));
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo.expect_mark_paid().never();

        let err = usecase(
            payment_repo,
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            gateway,
        )
        .confirm(user_id, payment_id)
        .await
        .unwrap_err();

        assert!(matches!(err, PaymentError::Gateway(_)));
    }

    #[tokio::test]
    async fn cancel_leaves_payment_untouched() {
        let user_id = Uuid::new_v4();
        let booking = booking(user_id);
        let pending = payment(booking.id, PaymentStatus::Pending);
        let payment_id = pending.id;

        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
        payment_repo.expect_mark_paid().never();

        let usecase = usecase(
            payment_repo,
            booking_repo_with(booking),
            MockCatalogRepository::new(),
            MockPaymentGateway::new(),
        );

        let message = usecase.cancel(user_id, payment_id).await.unwrap();
        assert_eq!(message.status, PaymentStatus::Pending);

        let err = usecase.cancel(Uuid::new_v4(), payment_id).await.unwrap_err();
        assert!(matches!(err, PaymentError::Forbidden(_)));
    }
}
