use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::sports_fields;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = sports_fields)]
pub struct SportsFieldEntity {
    pub id: Uuid,
    pub complex_id: Uuid,
    pub activity: String,
    pub price_minor: i32,
}
