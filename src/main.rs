mod app;
mod auth;
mod charts;
mod cities;
mod config;
mod forecasts;
mod state;
mod weather;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "weatherboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.weather.api_key.is_empty() {
        tracing::warn!("OPENWEATHERMAP_API_KEY is empty; weather pages will show stored data only");
    }
    tracing::info!(
        server = %config.mail.server,
        port = config.mail.port,
        tls = config.mail.use_tls,
        authenticated = config.mail.username.is_some() && config.mail.password.is_some(),
        "mail relay configured"
    );

    let addr = config.server.bind_addr()?;
    let app_state = AppState::init(config).await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    app::serve(app::build_app(app_state), addr).await
}
