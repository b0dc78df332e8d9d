use serde::{Deserialize, Serialize};

use super::repo_types::City;

/// One entry of the bootstrap city list file.
#[derive(Debug, Deserialize)]
pub struct CityRecord {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub coord: Coord,
}

#[derive(Debug, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl From<CityRecord> for City {
    fn from(r: CityRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            country: r.country,
            lat: r.coord.lat,
            lon: r.coord.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub inserted: u64,
    pub notice: String,
}
