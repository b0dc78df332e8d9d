use serde::Serialize;

use super::repo_types::Forecast;
use super::services::IngestOutcome;
use crate::cities::repo_types::City;

/// Everything a city weather page needs.
#[derive(Debug, Serialize)]
pub struct WeatherPage {
    pub city: City,
    pub ingest: IngestOutcome,
    pub forecasts: Vec<Forecast>,
    pub charts_html: String,
}
