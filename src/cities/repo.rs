use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::City;

/// Rows per `INSERT ... UNNEST` statement during bulk loads.
const INSERT_CHUNK: usize = 5_000;

impl City {
    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cities")
            .fetch_one(db)
            .await
            .context("count cities")?;
        Ok(n)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<City>> {
        let city = sqlx::query_as::<_, City>(
            r#"
            SELECT id, name, country, lat, lon
              FROM cities
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find city by id")?;
        Ok(city)
    }

    /// Exact, case-sensitive name match.
    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Vec<City>> {
        let rows = sqlx::query_as::<_, City>(
            r#"
            SELECT id, name, country, lat, lon
              FROM cities
             WHERE name = $1
             ORDER BY country ASC, id ASC
            "#,
        )
        .bind(name)
        .fetch_all(db)
        .await
        .context("find cities by name")?;
        Ok(rows)
    }

    /// Inserts all cities in one transaction; ids already present are skipped.
    pub async fn insert_many(db: &PgPool, cities: &[City]) -> anyhow::Result<u64> {
        let mut tx = db.begin().await.context("begin tx")?;
        let mut inserted = 0;

        for chunk in cities.chunks(INSERT_CHUNK) {
            let ids: Vec<i64> = chunk.iter().map(|c| c.id).collect();
            let names: Vec<&str> = chunk.iter().map(|c| c.name.as_str()).collect();
            let countries: Vec<&str> = chunk.iter().map(|c| c.country.as_str()).collect();
            let lats: Vec<f64> = chunk.iter().map(|c| c.lat).collect();
            let lons: Vec<f64> = chunk.iter().map(|c| c.lon).collect();

            let done = sqlx::query(
                r#"
                INSERT INTO cities (id, name, country, lat, lon)
                SELECT * FROM UNNEST($1::int8[], $2::text[], $3::text[], $4::float8[], $5::float8[])
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(ids)
            .bind(names)
            .bind(countries)
            .bind(lats)
            .bind(lons)
            .execute(&mut *tx)
            .await
            .context("insert cities")?;
            inserted += done.rows_affected();
        }

        tx.commit().await.context("commit tx")?;
        Ok(inserted)
    }
}
