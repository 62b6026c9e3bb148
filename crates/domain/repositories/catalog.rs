use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{sports_complexes::SportsComplexEntity, sports_fields::SportsFieldEntity},
    value_objects::enums::activities::Activity,
};

/// Read-only view of complexes and fields.
#[automock]
#[async_trait]
pub trait CatalogRepository {
    async fn list_complexes(&self, location: Option<String>) -> Result<Vec<SportsComplexEntity>>;
    async fn find_complex(&self, complex_id: Uuid) -> Result<Option<SportsComplexEntity>>;
    async fn list_fields(&self, activity: Option<Activity>) -> Result<Vec<SportsFieldEntity>>;
    async fn list_fields_of_complex(&self, complex_id: Uuid) -> Result<Vec<SportsFieldEntity>>;
    async fn find_field(&self, field_id: Uuid) -> Result<Option<SportsFieldEntity>>;
}
