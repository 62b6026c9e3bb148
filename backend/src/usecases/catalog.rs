use std::sync::Arc;

use crates::domain::{
    repositories::catalog::CatalogRepository,
    value_objects::{
        catalog::{FieldQuery, SportsComplexDto, SportsFieldDto},
        enums::activities::Activity,
    },
};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("sports complex {0} not found")]
    ComplexNotFound(Uuid),
    #[error("sports field {0} not found")]
    FieldNotFound(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CatalogError::ComplexNotFound(_) | CatalogError::FieldNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

pub struct CatalogUseCase<C>
where
    C: CatalogRepository + Send + Sync + 'static,
{
    catalog_repo: Arc<C>,
}

impl<C> CatalogUseCase<C>
where
    C: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(catalog_repo: Arc<C>) -> Self {
        Self { catalog_repo }
    }

    pub async fn get_facility(&self, complex_id: Uuid) -> CatalogResult<SportsComplexDto> {
        let complex = self
            .catalog_repo
            .find_complex(complex_id)
            .await
            .map_err(|err| {
                error!(%complex_id, db_error = ?err, "catalog: failed to load complex");
                CatalogError::Internal(err)
            })?
            .ok_or(CatalogError::ComplexNotFound(complex_id))?;

        let fields = self
            .catalog_repo
            .list_fields_of_complex(complex_id)
            .await
            .map_err(|err| {
                error!(%complex_id, db_error = ?err, "catalog: failed to load complex fields");
                CatalogError::Internal(err)
            })?;

        Ok(SportsComplexDto::new(complex, fields))
    }

    /// An unknown activity matches nothing rather than failing the request.
    pub async fn list_fields(&self, query: FieldQuery) -> CatalogResult<Vec<SportsFieldDto>> {
        let activity = match query.activity.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Activity::from_str(raw) {
                Some(activity) => Some(activity),
                None => {
                    warn!(activity = raw, "catalog: unknown activity filter");
                    return Ok(vec![]);
                }
            },
        };

        let fields = self.catalog_repo.list_fields(activity).await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list fields");
            CatalogError::Internal(err)
        })?;

        Ok(fields.into_iter().map(SportsFieldDto::from).collect())
    }

    pub async fn get_field(&self, field_id: Uuid) -> CatalogResult<SportsFieldDto> {
        let field = self
            .catalog_repo
            .find_field(field_id)
            .await
            .map_err(|err| {
                error!(%field_id, db_error = ?err, "catalog: failed to load field");
                CatalogError::Internal(err)
            })?
            .ok_or(CatalogError::FieldNotFound(field_id))?;

        Ok(field.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::{sports_complexes::SportsComplexEntity, sports_fields::SportsFieldEntity},
        repositories::catalog::MockCatalogRepository,
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn facility_includes_all_its_fields() {
        let complex_id = Uuid::new_v4();
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_find_complex()
            .with(eq(complex_id))
            .returning(|id| {
                Ok(Some(SportsComplexEntity {
                    id,
                    name: "Riverside".to_string(),
                    location: "Lisbon".to_string(),
                    created_at: Utc::now(),
                }))
            });
        catalog_repo
            .expect_list_fields_of_complex()
            .returning(|complex_id| {
                Ok(vec![SportsFieldEntity {
                    id: Uuid::new_v4(),
                    complex_id,
                    activity: "tennis".to_string(),
                    price_minor: 1550,
                }])
            });

        let usecase = CatalogUseCase::new(Arc::new(catalog_repo));
        let facility = usecase.get_facility(complex_id).await.unwrap();

        assert_eq!(facility.name, "Riverside");
        assert_eq!(facility.fields.len(), 1);
        assert_eq!(facility.fields[0].price, 1550);
    }

    #[tokio::test]
    async fn unknown_activity_lists_nothing() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_fields().never();

        let usecase = CatalogUseCase::new(Arc::new(catalog_repo));
        let fields = usecase
            .list_fields(FieldQuery {
                activity: Some("curling".to_string()),
            })
            .await
            .unwrap();

        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn activity_filter_is_case_insensitive() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_fields()
            .with(eq(Some(Activity::Soccer)))
            .times(1)
            .returning(|_| Ok(vec![]));

        let usecase = CatalogUseCase::new(Arc::new(catalog_repo));
        usecase
            .list_fields(FieldQuery {
                activity: Some("Soccer".to_string()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_field_is_not_found() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_find_field().returning(|_| Ok(None));

        let usecase = CatalogUseCase::new(Arc::new(catalog_repo));
        let err = usecase.get_field(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
