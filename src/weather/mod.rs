//! OpenWeatherMap client and the conversion from provider payloads to
//! storable forecasts.

pub mod client;
pub mod types;

pub use client::{OpenWeatherMap, WeatherClient};
pub use types::{NewForecast, ProviderResponse, WeatherError};
