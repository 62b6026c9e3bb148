use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::repositories::{bookings::BookingRepository, catalog::CatalogRepository},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{bookings::BookingPostgres, catalog::CatalogPostgres},
    },
};
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::bookings::BookingUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let booking_repository = BookingPostgres::new(Arc::clone(&db_pool));
    let catalog_repository = CatalogPostgres::new(Arc::clone(&db_pool));
    let usecase = BookingUseCase::new(Arc::new(booking_repository), Arc::new(catalog_repository));

    Router::new()
        .route("/", get(list_my_bookings))
        .route("/:booking_id", get(get_my_booking))
        .with_state(Arc::new(usecase))
}

pub async fn list_my_bookings<B, C>(
    State(usecase): State<Arc<BookingUseCase<B, C>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.list_for_user(user_id).await {
        Ok(bookings) => Json(bookings).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_my_booking<B, C>(
    State(usecase): State<Arc<BookingUseCase<B, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.get_for_user(user_id, booking_id).await {
        Ok(booking) => Json(booking).into_response(),
        Err(err) => err.into_response(),
    }
}
