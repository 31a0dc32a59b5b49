use std::convert::Infallible;
use std::time::Duration;

use axum::{
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use chrono::Utc;
use futures_util::Stream;
use log::debug;
use rand::Rng;

use crate::models::{fahrenheit, SUMMARIES};
use crate::openapi::EVENTS_TAG;
use crate::state::AppState;

const EVENT_INTERVAL: Duration = Duration::from_secs(1);

/// Live weather readings as server-sent events.
///
/// Emits one `weather` event per second, forever; clients disconnect when
/// they have seen enough. Token enforcement, when enabled, happens in the
/// gateway middleware before this handler runs.
#[utoipa::path(
    get,
    path = "/sse",
    tag = EVENTS_TAG,
    responses(
        (status = 200, description = "Event stream of weather readings", body = String, content_type = "text/event-stream")
    )
)]
pub(crate) async fn weather_events() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Client subscribed to the weather event stream");

    let stream = async_stream::stream! {
        let mut interval = tokio::time::interval(EVENT_INTERVAL);
        let mut sequence: u64 = 0;

        loop {
            interval.tick().await;
            sequence += 1;

            // ThreadRng is not Send, so it must not live across an await;
            // draw everything for this event inside one block.
            let payload = {
                let mut rng = rand::thread_rng();
                let celsius = rng.gen_range(-20..=55);
                serde_json::json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "temperatureC": celsius,
                    "temperatureF": fahrenheit(celsius),
                    "summary": SUMMARIES[rng.gen_range(0..SUMMARIES.len())],
                })
            };

            yield Ok(Event::default()
                .event("weather")
                .id(sequence.to_string())
                .data(payload.to_string()));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sse", get(weather_events))
}
