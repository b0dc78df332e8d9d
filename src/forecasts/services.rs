use std::collections::BTreeMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use super::repo_types::Forecast;
use crate::state::AppState;
use crate::weather::{NewForecast, ProviderResponse, WeatherClient, WeatherError};

/// What happened to the provider data during one page view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestOutcome {
    Updated { fetched: usize, inserted: u64 },
    Degraded { reason: String },
}

/// Fetches forecast plus trailing history and converts it to storable rows,
/// one per timestamp. A failed forecast call or a bad forecast entry fails
/// the whole batch; history failures only drop the affected history data.
pub async fn collect_entries(
    client: &dyn WeatherClient,
    city_id: i64,
    history_days: i64,
    now: OffsetDateTime,
) -> Result<Vec<NewForecast>, WeatherError> {
    let forecast = client.forecast(city_id).await?.into_entries()?;

    let history = if history_days > 0 {
        let start = now - Duration::days(history_days);
        match client
            .history(city_id, start, now)
            .await
            .and_then(ProviderResponse::into_entries)
        {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, city_id, "history fetch failed; storing forecast only");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let mut by_time = BTreeMap::new();
    for entry in history {
        match entry.into_new_forecast(city_id) {
            Ok(row) => {
                by_time.insert(row.data_time, row);
            }
            Err(e) => warn!(error = %e, city_id, "skipping history entry"),
        }
    }
    for entry in forecast {
        let row = entry.into_new_forecast(city_id)?;
        by_time.insert(row.data_time, row);
    }
    Ok(by_time.into_values().collect())
}

/// Pulls fresh provider data for a city and stores what is new. Provider
/// failures degrade to an outcome without any write; storage failures are
/// returned as errors.
pub async fn ingest_city(st: &AppState, city_id: i64) -> anyhow::Result<IngestOutcome> {
    let entries = match collect_entries(
        st.weather.as_ref(),
        city_id,
        st.config.weather.history_days,
        OffsetDateTime::now_utc(),
    )
    .await
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, city_id, "provider unavailable; using stored data");
            return Ok(IngestOutcome::Degraded {
                reason: e.to_string(),
            });
        }
    };

    let inserted = Forecast::upsert_many(&st.db, &entries).await?;
    info!(city_id, fetched = entries.len(), inserted, "forecasts ingested");
    Ok(IngestOutcome::Updated {
        fetched: entries.len(),
        inserted,
    })
}
