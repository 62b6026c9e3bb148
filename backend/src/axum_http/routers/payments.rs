use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, catalog::CatalogRepository, payments::PaymentRepository,
        },
        value_objects::payments::CreatePaymentRequest,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, catalog::CatalogPostgres, payments::PaymentPostgres,
        },
    },
    payments::stripe_client::StripeClient,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    config::config_model::DotEnvyConfig,
    usecases::payments::{PaymentGateway, PaymentUseCase},
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    stripe_client: Arc<StripeClient>,
) -> Router {
    let payment_repository = PaymentPostgres::new(Arc::clone(&db_pool));
    let booking_repository = BookingPostgres::new(Arc::clone(&db_pool));
    let catalog_repository = CatalogPostgres::new(Arc::clone(&db_pool));

    let usecase = PaymentUseCase::new(
        Arc::new(payment_repository),
        Arc::new(booking_repository),
        Arc::new(catalog_repository),
        stripe_client,
        config.backend_server.public_base_url.clone(),
    );

    Router::new()
        .route("/", get(list_my_payments).post(initiate_payment))
        .route("/:payment_id", get(get_my_payment))
        .route("/:payment_id/success", get(payment_success))
        .route("/:payment_id/cancel", get(payment_cancel))
        .with_state(Arc::new(usecase))
}

pub async fn initiate_payment<P, B, C, G>(
    State(usecase): State<Arc<PaymentUseCase<P, B, C, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<CreatePaymentRequest>,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!(%user_id, booking_id = %request.booking_id, "payments: initiate request received");

    match usecase.initiate(user_id, request.booking_id).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_my_payments<P, B, C, G>(
    State(usecase): State<Arc<PaymentUseCase<P, B, C, G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.list_for_user(user_id).await {
        Ok(payments) => Json(payments).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_my_payment<P, B, C, G>(
    State(usecase): State<Arc<PaymentUseCase<P, B, C, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.get_for_user(user_id, payment_id).await {
        Ok(payment) => Json(payment).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn payment_success<P, B, C, G>(
    State(usecase): State<Arc<PaymentUseCase<P, B, C, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!(%user_id, %payment_id, "payments: success callback received");

    match usecase.confirm(user_id, payment_id).await {
        Ok(message) => Json(message).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn payment_cancel<P, B, C, G>(
    State(usecase): State<Arc<PaymentUseCase<P, B, C, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.cancel(user_id, payment_id).await {
        Ok(message) => Json(message).into_response(),
        Err(err) => err.into_response(),
    }
}
