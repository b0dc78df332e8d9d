use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use time::OffsetDateTime;
use tracing::debug;

use super::{ProviderResponse, WeatherError};
use crate::config::WeatherConfig;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Multi-day forecast list for a city.
    async fn forecast(&self, city_id: i64) -> Result<ProviderResponse, WeatherError>;

    /// Hourly observations for a city between `start` and `end`.
    async fn history(
        &self,
        city_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<ProviderResponse, WeatherError>;
}

#[derive(Clone)]
pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    history_url: String,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(cfg: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            history_url: cfg.history_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    async fn fetch(&self, url: String, query: &[(&str, String)]) -> Result<ProviderResponse, WeatherError> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(%url, %status, bytes = text.len(), "provider responded");

        if !status.is_success() {
            return Err(WeatherError::Upstream {
                code: status.as_u16().to_string(),
                message: text,
            });
        }

        let body: ProviderResponse =
            serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))?;

        if !body.cod.is_success() {
            return Err(WeatherError::Upstream {
                code: body.cod.to_string(),
                message: match body.message {
                    Some(serde_json::Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
            });
        }

        if body.list.is_none() {
            return Err(WeatherError::Parse("missing `list` key".into()));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherMap {
    async fn forecast(&self, city_id: i64) -> Result<ProviderResponse, WeatherError> {
        self.fetch(
            format!("{}/data/2.5/forecast", self.base_url),
            &[("id", city_id.to_string()), ("mode", "json".into())],
        )
        .await
    }

    async fn history(
        &self,
        city_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<ProviderResponse, WeatherError> {
        self.fetch(
            format!("{}/data/2.5/history/city", self.history_url),
            &[
                ("id", city_id.to_string()),
                ("type", "hour".into()),
                ("start", start.unix_timestamp().to_string()),
                ("end", end.unix_timestamp().to_string()),
            ],
        )
        .await
    }
}
