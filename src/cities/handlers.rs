use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{BootstrapResponse, SearchQuery};
use super::repo_types::City;
use super::services::{bootstrap_cities, BootstrapOutcome};
use crate::{auth::extractors::AuthUser, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/cities/search", get(search_cities))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/cities/bootstrap", post(bootstrap))
}

#[instrument(skip(state, _user))]
pub async fn search_cities(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<City>>, (StatusCode, String)> {
    let name = q.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }

    let cities = City::find_by_name(&state.db, name).await.map_err(|e| {
        error!(error = %e, "city search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    if cities.is_empty() {
        return Err((StatusCode::NOT_FOUND, format!("City {} not found", name)));
    }
    Ok(Json(cities))
}

#[instrument(skip_all)]
pub async fn bootstrap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<BootstrapResponse>), (StatusCode, String)> {
    match bootstrap_cities(&state).await {
        Ok(BootstrapOutcome::Loaded(inserted)) => {
            info!(user_id = %user.id, inserted, "cities bootstrapped");
            Ok((
                StatusCode::CREATED,
                Json(BootstrapResponse {
                    inserted,
                    notice: format!("Loaded {} cities", inserted),
                }),
            ))
        }
        Ok(BootstrapOutcome::AlreadyLoaded) => Ok((
            StatusCode::OK,
            Json(BootstrapResponse {
                inserted: 0,
                notice: "Cities are already loaded".into(),
            }),
        )),
        Err(e) => {
            error!(error = %e, "city bootstrap failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{app::build_app, state::AppState};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn search_requires_token() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .uri("/api/v1/cities/search?name=Kyiv")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bootstrap_rejects_garbage_token() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/cities/bootstrap")
            .header("authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
