use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{sports_complexes::SportsComplexEntity, sports_fields::SportsFieldEntity},
    value_objects::money::as_decimal_string,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldQuery {
    pub activity: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SportsFieldDto {
    pub id: Uuid,
    pub complex_id: Uuid,
    pub activity: String,
    #[serde(serialize_with = "as_decimal_string::serialize")]
    pub price: i32,
}

impl From<SportsFieldEntity> for SportsFieldDto {
    fn from(value: SportsFieldEntity) -> Self {
        Self {
            id: value.id,
            complex_id: value.complex_id,
            activity: value.activity,
            price: value.price_minor,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SportsComplexDto {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub fields: Vec<SportsFieldDto>,
}

impl SportsComplexDto {
    pub fn new(complex: SportsComplexEntity, fields: Vec<SportsFieldEntity>) -> Self {
        Self {
            id: complex.id,
            name: complex.name,
            location: complex.location,
            fields: fields.into_iter().map(SportsFieldDto::from).collect(),
        }
    }
}
