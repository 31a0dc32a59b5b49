use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use http::StatusCode;
use log::warn;

use crate::api::auth_middleware::AuthContext;
use crate::errors::scope_denied_response;
use crate::models::WeatherForecast;
use crate::openapi::FORECAST_TAG;
use crate::state::AppState;

/// Scope the forecast endpoint demands on top of a valid token.
pub(crate) const REQUIRED_SCOPE: &str = "weatherget";

/// Number of days the forecast covers, starting tomorrow.
const FORECAST_DAYS: i64 = 5;

/// Returns a five-day random forecast.
///
/// Requires a valid bearer token carrying the `weatherget` scope.
#[utoipa::path(
    get,
    path = "/weatherforecast",
    tag = FORECAST_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Forecast for the next five days", body = [WeatherForecast]),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Token lacks the weatherget scope")
    )
)]
pub(crate) async fn get_forecast(context: AuthContext) -> Response {
    if !context.claims.has_scope(REQUIRED_SCOPE) {
        warn!(
            "Principal '{}' requested the forecast without the '{REQUIRED_SCOPE}' scope",
            context.claims.principal().unwrap_or("<none>")
        );
        return scope_denied_response(REQUIRED_SCOPE);
    }

    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let forecast: Vec<WeatherForecast> = (1..=FORECAST_DAYS)
        .map(|day| WeatherForecast::random_for(today + Duration::days(day), &mut rng))
        .collect();

    (StatusCode::OK, Json(forecast)).into_response()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/weatherforecast", get(get_forecast))
}
