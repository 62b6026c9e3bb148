use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{sports_complexes, sports_fields},
};
use domain::{
    entities::{sports_complexes::SportsComplexEntity, sports_fields::SportsFieldEntity},
    repositories::catalog::CatalogRepository,
    value_objects::enums::activities::Activity,
};

pub struct CatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Makes `value` match itself literally under ILIKE.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CatalogRepository for CatalogPostgres {
    async fn list_complexes(&self, location: Option<String>) -> Result<Vec<SportsComplexEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let mut query = sports_complexes::table
            .select(SportsComplexEntity::as_select())
            .order(sports_complexes::name.asc())
            .into_boxed();

        if let Some(location) = location {
            query = query.filter(sports_complexes::location.ilike(escape_like(&location)));
        }

        let results = query.load::<SportsComplexEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_complex(&self, complex_id: Uuid) -> Result<Option<SportsComplexEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = sports_complexes::table
            .find(complex_id)
            .select(SportsComplexEntity::as_select())
            .first::<SportsComplexEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_fields(&self, activity: Option<Activity>) -> Result<Vec<SportsFieldEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let mut query = sports_fields::table
            .select(SportsFieldEntity::as_select())
            .order((sports_fields::complex_id.asc(), sports_fields::id.asc()))
            .into_boxed();

        if let Some(activity) = activity {
            query = query.filter(sports_fields::activity.eq(activity.as_str()));
        }

        let results = query.load::<SportsFieldEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_fields_of_complex(&self, complex_id: Uuid) -> Result<Vec<SportsFieldEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = sports_fields::table
            .filter(sports_fields::complex_id.eq(complex_id))
            .select(SportsFieldEntity::as_select())
            .order(sports_fields::id.asc())
            .load::<SportsFieldEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_field(&self, field_id: Uuid) -> Result<Option<SportsFieldEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = sports_fields::table
            .find(field_id)
            .select(SportsFieldEntity::as_select())
            .first::<SportsFieldEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("Kyiv"), "Kyiv");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
