use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Forecast {
    pub id: i64,
    pub city_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub data_time: OffsetDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub clouds: String,
    pub pressure: f64,
    pub description: String,
}
