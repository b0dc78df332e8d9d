use std::path::Path;

use anyhow::Context;
use tracing::info;

use super::dto::CityRecord;
use super::repo_types::City;
use crate::state::AppState;

#[derive(Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Loaded(u64),
    AlreadyLoaded,
}

pub fn parse_city_list(raw: &str) -> anyhow::Result<Vec<City>> {
    let records: Vec<CityRecord> = serde_json::from_str(raw).context("parse city list")?;
    Ok(records.into_iter().map(City::from).collect())
}

pub async fn read_city_list(path: &Path) -> anyhow::Result<Vec<City>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read city list {}", path.display()))?;
    parse_city_list(&raw)
}

/// Loads the reference city list once; later calls are no-ops.
pub async fn bootstrap_cities(st: &AppState) -> anyhow::Result<BootstrapOutcome> {
    if City::count(&st.db).await? > 0 {
        return Ok(BootstrapOutcome::AlreadyLoaded);
    }

    let cities = read_city_list(&st.config.city_list_path).await?;
    let inserted = City::insert_many(&st.db, &cities).await?;
    info!(inserted, total = cities.len(), "city list loaded");
    Ok(BootstrapOutcome::Loaded(inserted))
}
