use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::Forecast;
use crate::weather::NewForecast;

impl Forecast {
    /// Stores the batch as one statement. Rows whose (city, time) already
    /// exist are skipped; returns how many rows were actually inserted.
    pub async fn upsert_many(db: &PgPool, batch: &[NewForecast]) -> anyhow::Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let city_ids: Vec<i64> = batch.iter().map(|f| f.city_id).collect();
        let times: Vec<OffsetDateTime> = batch.iter().map(|f| f.data_time).collect();
        let temps: Vec<f64> = batch.iter().map(|f| f.temperature).collect();
        let winds: Vec<f64> = batch.iter().map(|f| f.wind_speed).collect();
        let clouds: Vec<&str> = batch.iter().map(|f| f.clouds.as_str()).collect();
        let pressures: Vec<f64> = batch.iter().map(|f| f.pressure).collect();
        let descriptions: Vec<&str> = batch.iter().map(|f| f.description.as_str()).collect();

        let done = sqlx::query(
            r#"
            INSERT INTO forecasts (city_id, data_time, temperature, wind_speed, clouds, pressure, description)
            SELECT * FROM UNNEST(
                $1::int8[], $2::timestamptz[], $3::float8[], $4::float8[],
                $5::text[], $6::float8[], $7::text[]
            )
            ON CONFLICT (city_id, data_time) DO NOTHING
            "#,
        )
        .bind(city_ids)
        .bind(times)
        .bind(temps)
        .bind(winds)
        .bind(clouds)
        .bind(pressures)
        .bind(descriptions)
        .execute(db)
        .await
        .context("upsert forecasts")?;

        Ok(done.rows_affected())
    }

    pub async fn list_by_city(db: &PgPool, city_id: i64) -> anyhow::Result<Vec<Forecast>> {
        Self::list_by_city_since(db, city_id, None).await
    }

    /// Stored forecasts for a city at or after `since` (all of them when
    /// `None`), oldest first.
    pub async fn list_by_city_since(
        db: &PgPool,
        city_id: i64,
        since: Option<OffsetDateTime>,
    ) -> anyhow::Result<Vec<Forecast>> {
        let rows = sqlx::query_as::<_, Forecast>(
            r#"
            SELECT id, city_id, data_time, temperature, wind_speed, clouds, pressure, description
              FROM forecasts
             WHERE city_id = $1
               AND ($2::timestamptz IS NULL OR data_time >= $2)
             ORDER BY data_time ASC
            "#,
        )
        .bind(city_id)
        .bind(since)
        .fetch_all(db)
        .await
        .context("list forecasts by city")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::repo_types::City;

    fn new_forecast(city_id: i64, ts: i64) -> NewForecast {
        NewForecast {
            city_id,
            data_time: OffsetDateTime::from_unix_timestamp(ts).unwrap(),
            temperature: 12.0,
            wind_speed: 3.0,
            clouds: "20%".into(),
            pressure: 1010.0,
            description: "few clouds".into(),
        }
    }

    async fn seed_city(pool: &PgPool, id: i64) {
        let city = City {
            id,
            name: "Kyiv".into(),
            country: "UA".into(),
            lat: 50.43,
            lon: 30.52,
        };
        City::insert_many(pool, &[city]).await.unwrap();
    }

    #[sqlx::test]
    async fn upsert_is_idempotent(pool: PgPool) {
        seed_city(&pool, 703448).await;
        let batch: Vec<_> = (0..5).map(|i| new_forecast(703448, 1_700_000_000 + i * 10_800)).collect();

        assert_eq!(Forecast::upsert_many(&pool, &batch).await.unwrap(), 5);
        assert_eq!(Forecast::upsert_many(&pool, &batch).await.unwrap(), 0);

        let stored = Forecast::list_by_city(&pool, 703448).await.unwrap();
        assert_eq!(stored.len(), 5);
        assert!(stored.windows(2).all(|w| w[0].data_time < w[1].data_time));
    }

    #[sqlx::test]
    async fn list_since_drops_older_rows(pool: PgPool) {
        seed_city(&pool, 703448).await;
        let batch: Vec<_> = (0..4).map(|i| new_forecast(703448, 1_700_000_000 + i * 3_600)).collect();
        Forecast::upsert_many(&pool, &batch).await.unwrap();

        let since = OffsetDateTime::from_unix_timestamp(1_700_007_200).unwrap();
        let recent = Forecast::list_by_city_since(&pool, 703448, Some(since)).await.unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].data_time, since);
    }

    #[sqlx::test]
    async fn upsert_rejects_unknown_city(pool: PgPool) {
        let err = Forecast::upsert_many(&pool, &[new_forecast(999, 1)]).await;
        assert!(err.is_err());
    }
}
