use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{bookings::BookingRepository, catalog::CatalogRepository},
        value_objects::{bookings::CreateBookingRequest, catalog::FieldQuery},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{bookings::BookingPostgres, catalog::CatalogPostgres},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    usecases::{bookings::BookingUseCase, catalog::CatalogUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let catalog_repository = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));

    let catalog_usecase = CatalogUseCase::new(Arc::clone(&catalog_repository));
    let booking_usecase = BookingUseCase::new(booking_repository, catalog_repository);

    let catalog_routes: Router = Router::new()
        .route("/", get(list_fields))
        .route("/:field_id", get(get_field))
        .with_state(Arc::new(catalog_usecase));
    let booking_routes: Router = Router::new()
        .route("/:field_id/schedule", get(field_schedule))
        .route("/:field_id/booking", post(book_slots))
        .with_state(Arc::new(booking_usecase));

    catalog_routes.merge(booking_routes)
}

pub async fn list_fields<C>(
    State(usecase): State<Arc<CatalogUseCase<C>>>,
    Query(query): Query<FieldQuery>,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.list_fields(query).await {
        Ok(fields) => Json(fields).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_field<C>(
    State(usecase): State<Arc<CatalogUseCase<C>>>,
    Path(field_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.get_field(field_id).await {
        Ok(field) => Json(field).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn field_schedule<B, C>(
    State(usecase): State<Arc<BookingUseCase<B, C>>>,
    Path(field_id): Path<Uuid>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.field_schedule(field_id).await {
        Ok(schedule) => Json(schedule).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn book_slots<B, C>(
    State(usecase): State<Arc<BookingUseCase<B, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(field_id): Path<Uuid>,
    Json(slots): Json<CreateBookingRequest>,
) -> impl IntoResponse
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    info!(%user_id, %field_id, "fields: booking request received");

    match usecase.book_slots(user_id, field_id, slots).await {
        Ok(bookings) => (StatusCode::CREATED, Json(bookings)).into_response(),
        Err(err) => err.into_response(),
    }
}
