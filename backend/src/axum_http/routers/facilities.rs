use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::{bookings::BookingRepository, catalog::CatalogRepository},
        value_objects::availability::FacilityQuery,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{bookings::BookingPostgres, catalog::CatalogPostgres},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::usecases::{availability::AvailabilityUseCase, catalog::CatalogUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let catalog_repository = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));

    let availability_usecase =
        AvailabilityUseCase::new(Arc::clone(&catalog_repository), booking_repository);
    let catalog_usecase = CatalogUseCase::new(catalog_repository);

    let search_routes: Router = Router::new()
        .route("/", get(list_facilities))
        .with_state(Arc::new(availability_usecase));
    let detail_routes: Router = Router::new()
        .route("/:complex_id", get(get_facility))
        .with_state(Arc::new(catalog_usecase));

    search_routes.merge(detail_routes)
}

pub async fn list_facilities<C, B>(
    State(usecase): State<Arc<AvailabilityUseCase<C, B>>>,
    Query(query): Query<FacilityQuery>,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
{
    info!("facilities: search request received");

    match usecase.list_facilities(query).await {
        Ok(facilities) => Json(facilities).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_facility<C>(
    State(usecase): State<Arc<CatalogUseCase<C>>>,
    Path(complex_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync + 'static,
{
    match usecase.get_facility(complex_id).await {
        Ok(facility) => Json(facility).into_response(),
        Err(err) => err.into_response(),
    }
}
