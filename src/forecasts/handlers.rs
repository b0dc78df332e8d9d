use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{error, instrument};

use super::dto::WeatherPage;
use super::repo_types::Forecast;
use super::services::ingest_city;
use crate::{auth::extractors::AuthUser, charts, cities::repo_types::City, state::AppState};

/// Days of stored data shown on a page when history fetching is disabled.
const MIN_PAGE_DAYS: i64 = 1;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/cities/:id/weather", get(city_weather))
}

/// Oldest timestamp shown on a page: the history window, but never less
/// than a day. Forecasts reach into the future and are always included.
pub(crate) fn page_window_start(now: OffsetDateTime, history_days: i64) -> OffsetDateTime {
    now - Duration::days(history_days.max(MIN_PAGE_DAYS))
}

/// Stored history plus whatever the provider returns now, with charts.
#[instrument(skip(state, _user))]
pub async fn city_weather(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<WeatherPage>, (StatusCode, String)> {
    let city = City::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("City {} not found", id)))?;

    let ingest = ingest_city(&state, city.id).await.map_err(|e| {
        error!(error = %e, city_id = city.id, "ingest failed");
        internal(e)
    })?;

    let since = page_window_start(OffsetDateTime::now_utc(), state.config.weather.history_days);
    let forecasts = Forecast::list_by_city_since(&state.db, city.id, Some(since))
        .await
        .map_err(internal)?;
    let charts_html = charts::render(&forecasts);

    Ok(Json(WeatherPage {
        city,
        ingest,
        forecasts,
        charts_html,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecasts::services::test_support::{entry, response, ScriptedWeather};
    use crate::forecasts::services::IngestOutcome;
    use sqlx::PgPool;
    use std::sync::Arc;

    fn state_with(pool: PgPool, client: ScriptedWeather) -> AppState {
        let fake = AppState::fake();
        AppState::from_parts(pool, fake.config.clone(), Arc::new(client))
    }

    async fn login_as_someone(state: &AppState) -> AuthUser {
        let hash = crate::auth::password::hash_password("long-enough-pw").unwrap();
        let user = crate::auth::repo_types::User::create(&state.db, "viewer", "v@example.com", &hash)
            .await
            .unwrap();
        AuthUser(user)
    }

    #[test]
    fn page_window_follows_history_days() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(page_window_start(now, 14), now - Duration::days(14));
        assert_eq!(page_window_start(now, 0), now - Duration::days(1));
    }

    #[sqlx::test]
    async fn unknown_city_is_not_found(pool: PgPool) {
        let state = state_with(pool, ScriptedWeather::new(None, None));
        let user = login_as_someone(&state).await;

        let err = city_weather(State(state), user, Path(42)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn degraded_page_shows_stored_history(pool: PgPool) {
        City::insert_many(
            &pool,
            &[City {
                id: 703448,
                name: "Kyiv".into(),
                country: "UA".into(),
                lat: 50.43,
                lon: 30.52,
            }],
        )
        .await
        .unwrap();

        let stale = crate::weather::NewForecast {
            city_id: 703448,
            data_time: OffsetDateTime::from_unix_timestamp(1_000_000_000).unwrap(),
            temperature: 5.0,
            wind_speed: 1.0,
            clouds: "0%".into(),
            pressure: 1000.0,
            description: "clear sky".into(),
        };
        Forecast::upsert_many(&pool, &[stale]).await.unwrap();

        let ok = response(vec![entry(1_800_000_000, 290.0), entry(1_800_010_800, 291.0)]);
        let warm = state_with(pool.clone(), ScriptedWeather::new(Some(ok), None));
        let user = login_as_someone(&warm).await;
        city_weather(State(warm), user, Path(703448)).await.unwrap();

        let broken = state_with(pool, ScriptedWeather::new(None, None));
        let user = AuthUser(
            crate::auth::repo_types::User::find_by_username(&broken.db, "viewer")
                .await
                .unwrap()
                .unwrap(),
        );
        let Json(page) = city_weather(State(broken), user, Path(703448)).await.unwrap();

        assert!(matches!(page.ingest, IngestOutcome::Degraded { .. }));
        assert_eq!(page.forecasts.len(), 2);
        assert!(page.charts_html.contains("Temperature dependency"));
    }
}
