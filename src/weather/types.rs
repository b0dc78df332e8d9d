use serde::Deserialize;
use time::OffsetDateTime;

/// Offset between Kelvin (provider unit) and Celsius (display unit).
pub const KELVIN_OFFSET: f64 = 273.15;

/// Provider status code. OpenWeatherMap sends `cod` as a number on some
/// endpoints and as a numeric string on others, so both are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderCode {
    Number(i64),
    Text(String),
}

impl ProviderCode {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Number(n) => *n == 200,
            Self::Text(s) => s.trim().parse::<i64>().map(|n| n == 200).unwrap_or(false),
        }
    }
}

impl std::fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Body of the forecast and history endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResponse {
    pub cod: ProviderCode,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    /// Absent on error bodies; a success body without it is malformed.
    pub list: Option<Vec<ListEntry>>,
}

impl ProviderResponse {
    pub fn into_entries(self) -> Result<Vec<ListEntry>, WeatherError> {
        self.list
            .ok_or_else(|| WeatherError::Parse("missing `list` key".into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEntry {
    pub dt: i64,
    pub main: MainBlock,
    pub wind: WindBlock,
    pub clouds: CloudsBlock,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindBlock {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudsBlock {
    pub all: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub description: String,
}

/// A forecast converted to display units, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForecast {
    pub city_id: i64,
    pub data_time: OffsetDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub clouds: String,
    pub pressure: f64,
    pub description: String,
}

/// Kelvin to whole degrees Celsius, truncated toward zero.
pub fn kelvin_to_celsius(kelvin: f64) -> i32 {
    (kelvin - KELVIN_OFFSET).trunc() as i32
}

impl ListEntry {
    pub fn into_new_forecast(self, city_id: i64) -> Result<NewForecast, WeatherError> {
        let data_time = OffsetDateTime::from_unix_timestamp(self.dt)
            .map_err(|_| WeatherError::InvalidTimestamp(self.dt))?;
        let description = self
            .weather
            .iter()
            .map(|c| c.description.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(NewForecast {
            city_id,
            data_time,
            temperature: f64::from(kelvin_to_celsius(self.main.temp)),
            wind_speed: self.wind.speed,
            clouds: format!("{}%", self.clouds.all),
            pressure: self.main.pressure,
            description,
        })
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned status {code}: {message}")]
    Upstream { code: String, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}
