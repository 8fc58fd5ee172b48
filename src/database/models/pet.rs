use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pet row. `owner_id` is the `created_by` column and never changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub price: f64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub price: f64,
    pub owner_id: i64,
}

/// Fields a pet update may replace; the owner is not one of them.
#[derive(Debug, Clone)]
pub struct PetChanges {
    pub name: String,
    pub species: String,
    pub price: f64,
}
