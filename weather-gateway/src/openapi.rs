use crate::state::AppState;
use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub(crate) const FORECAST_TAG: &str = "Forecast API";
pub(crate) const DIAGNOSTICS_TAG: &str = "Diagnostics API";
pub(crate) const EVENTS_TAG: &str = "Events API";
pub(crate) const HEALTH_TAG: &str = "Health API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = FORECAST_TAG, description = "Weather forecast endpoints"),
        (name = DIAGNOSTICS_TAG, description = "Gateway diagnostics endpoints"),
        (name = EVENTS_TAG, description = "Server-sent event streams"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    ),
    paths(
        crate::api::forecast::get_forecast,
        crate::api::message::post_message,
        crate::api::message::get_message,
        crate::api::sse::weather_events,
        crate::api::health::health_check,
    ),
    components(schemas(
        crate::models::WeatherForecast,
        crate::models::MessageAck,
        crate::api::health::Health,
    )),
    modifiers(&SecurityAddon),
    info(
        title = "Weather Gateway API",
        description = "Token-protected weather API behind an authorization gateway",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;

/// Registers the bearer-token security scheme the protected paths refer to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Handler for the OpenAPI JSON specification endpoint
async fn openapi_json_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates a router for OpenAPI documentation routes
pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json_handler))
}
