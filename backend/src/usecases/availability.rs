use std::{collections::HashMap, sync::Arc};

use chrono::Utc;

use crates::domain::{
    entities::sports_fields::SportsFieldEntity,
    repositories::{bookings::BookingRepository, catalog::CatalogRepository},
    value_objects::{
        availability::{AvailabilityFilter, FacilityQuery, available_fields},
        catalog::SportsComplexDto,
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::catalog::{CatalogError, CatalogResult};

/// Facility search with the booking-conflict filter applied.
pub struct AvailabilityUseCase<C, B>
where
    C: CatalogRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
{
    catalog_repo: Arc<C>,
    booking_repo: Arc<B>,
}

impl<C, B> AvailabilityUseCase<C, B>
where
    C: CatalogRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
{
    pub fn new(catalog_repo: Arc<C>, booking_repo: Arc<B>) -> Self {
        Self {
            catalog_repo,
            booking_repo,
        }
    }

    /// Complexes with at least one matching field free for the requested
    /// window, each carrying only those fields. A malformed filter yields an
    /// empty listing.
    pub async fn list_facilities(&self, query: FacilityQuery) -> CatalogResult<Vec<SportsComplexDto>> {
        let filter = match AvailabilityFilter::parse(&query) {
            Ok(filter) => filter,
            Err(err) => {
                warn!(error = %err, "availability: malformed filter, returning no matches");
                return Ok(vec![]);
            }
        };

        info!(
            activity = ?filter.activity,
            location = ?filter.location,
            date = ?filter.window.date,
            time = ?filter.window.time,
            duration_hours = filter.window.duration_hours,
            "availability: facility search"
        );

        let complexes = self
            .catalog_repo
            .list_complexes(filter.location.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "availability: failed to list complexes");
                CatalogError::Internal(err)
            })?;
        if complexes.is_empty() {
            return Ok(vec![]);
        }

        let fields = self
            .catalog_repo
            .list_fields(filter.activity)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "availability: failed to list fields");
                CatalogError::Internal(err)
            })?;

        let booked = if filter.window.is_unbounded() {
            vec![]
        } else {
            self.booking_repo
                .list_booked_slots(filter.window.booked_slot_query(Utc::now().date_naive()))
                .await
                .map_err(|err| {
                    error!(db_error = ?err, "availability: failed to load booked slots");
                    CatalogError::Internal(err)
                })?
        };

        let free = available_fields(fields, &booked, &filter.window);

        let mut by_complex: HashMap<Uuid, Vec<SportsFieldEntity>> = HashMap::new();
        for field in free {
            by_complex.entry(field.complex_id).or_default().push(field);
        }

        let facilities: Vec<SportsComplexDto> = complexes
            .into_iter()
            .filter_map(|complex| {
                by_complex
                    .remove(&complex.id)
                    .map(|fields| SportsComplexDto::new(complex, fields))
            })
            .collect();

        debug!(matches = facilities.len(), "availability: search finished");

        Ok(facilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use crates::domain::{
        entities::{bookings::BookedSlotEntity, sports_complexes::SportsComplexEntity},
        repositories::{bookings::MockBookingRepository, catalog::MockCatalogRepository},
        value_objects::enums::activities::Activity,
    };
    use mockall::predicate::eq;

    fn complex(name: &str, location: &str) -> SportsComplexEntity {
        SportsComplexEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: location.to_string(),
            created_at: Utc::now(),
        }
    }

    fn field(complex_id: Uuid, activity: &str) -> SportsFieldEntity {
        SportsFieldEntity {
            id: Uuid::new_v4(),
            complex_id,
            activity: activity.to_string(),
            price_minor: 2000,
        }
    }

    fn query(activity: &str, date: &str, time: &str) -> FacilityQuery {
        FacilityQuery {
            activity: Some(activity.to_string()),
            location: Some("Lisbon".to_string()),
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            duration: None,
        }
    }

    #[tokio::test]
    async fn booked_field_is_hidden_and_empty_complex_dropped() {
        let north = complex("North", "Lisbon");
        let south = complex("South", "Lisbon");
        let north_court = field(north.id, "tennis");
        let south_court = field(south.id, "tennis");
        let south_second = field(south.id, "tennis");
        let busy_id = north_court.id;
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let complexes = vec![north.clone(), south.clone()];
        let fields = vec![north_court, south_court.clone(), south_second.clone()];

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_complexes()
            .with(eq(Some("Lisbon".to_string())))
            .returning(move |_| Ok(complexes.clone()));
        catalog_repo
            .expect_list_fields()
            .with(eq(Some(Activity::Tennis)))
            .returning(move |_| Ok(fields.clone()));

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_list_booked_slots()
            .withf(move |bounds| {
                bounds.day == Some(day)
                    && bounds.not_before.is_none()
                    && bounds.starts_at_or_before == NaiveTime::from_hms_opt(14, 0, 0)
                    && bounds.starts_after == NaiveTime::from_hms_opt(13, 0, 0)
            })
            .returning(move |_| {
                Ok(vec![BookedSlotEntity {
                    field_id: busy_id,
                    day,
                    time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                }])
            });

        let usecase = AvailabilityUseCase::new(Arc::new(catalog_repo), Arc::new(booking_repo));
        let result = usecase
            .list_facilities(query("tennis", "2024-06-10", "14:00"))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, south.id);
        let ids: Vec<Uuid> = result[0].fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![south_court.id, south_second.id]);
    }

    #[tokio::test]
    async fn malformed_filter_returns_empty_without_queries() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_complexes().never();
        catalog_repo.expect_list_fields().never();
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_list_booked_slots().never();

        let usecase = AvailabilityUseCase::new(Arc::new(catalog_repo), Arc::new(booking_repo));
        let result = usecase
            .list_facilities(query("tennis", "not-a-date", "14:00"))
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn no_window_skips_booking_lookup() {
        let north = complex("North", "Porto");
        let court = field(north.id, "soccer");
        let complexes = vec![north];
        let fields = vec![court];

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_complexes()
            .with(eq(None::<String>))
            .returning(move |_| Ok(complexes.clone()));
        catalog_repo
            .expect_list_fields()
            .with(eq(None::<Activity>))
            .returning(move |_| Ok(fields.clone()));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_list_booked_slots().never();

        let usecase = AvailabilityUseCase::new(Arc::new(catalog_repo), Arc::new(booking_repo));
        let result = usecase
            .list_facilities(FacilityQuery::default())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].fields.len(), 1);
    }

    #[tokio::test]
    async fn time_only_search_loads_upcoming_slots_in_range() {
        let north = complex("North", "Lisbon");
        let court = field(north.id, "padel");
        let complexes = vec![north];
        let fields = vec![court];
        let today = Utc::now().date_naive();

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_complexes()
            .returning(move |_| Ok(complexes.clone()));
        catalog_repo
            .expect_list_fields()
            .returning(move |_| Ok(fields.clone()));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_list_booked_slots()
            .withf(move |bounds| {
                bounds.day.is_none()
                    && bounds.not_before.is_some_and(|first| first >= today)
                    && bounds.starts_after == NaiveTime::from_hms_opt(16, 0, 0)
                    && bounds.starts_at_or_before == NaiveTime::from_hms_opt(18, 0, 0)
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        let usecase = AvailabilityUseCase::new(Arc::new(catalog_repo), Arc::new(booking_repo));
        let result = usecase
            .list_facilities(FacilityQuery {
                time: Some("18:00".to_string()),
                duration: Some("2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }
}
