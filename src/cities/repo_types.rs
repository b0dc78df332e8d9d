use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}
