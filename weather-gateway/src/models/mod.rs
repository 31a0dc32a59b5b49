use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary labels, coldest to hottest, matching the classic forecast demo.
pub const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering",
    "Scorching",
];

/// A single day's forecast
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    /// Forecast date
    pub date: NaiveDate,
    /// Temperature in degrees Celsius
    pub temperature_c: i32,
    /// Temperature in degrees Fahrenheit, derived from `temperature_c`
    pub temperature_f: i32,
    /// Human-readable summary; null when absent
    pub summary: Option<String>,
}

impl WeatherForecast {
    /// Generates a random forecast for the given date.
    pub fn random_for<R: Rng>(date: NaiveDate, rng: &mut R) -> Self {
        let temperature_c = rng.gen_range(-20..=55);
        let summary = SUMMARIES[rng.gen_range(0..SUMMARIES.len())];
        Self {
            date,
            temperature_c,
            temperature_f: fahrenheit(temperature_c),
            summary: Some(summary.to_string()),
        }
    }
}

/// Celsius-to-Fahrenheit conversion using the demo's 0.5556 divisor, which
/// rounds slightly differently than 9/5 for some inputs. Kept for parity
/// with existing clients.
pub fn fahrenheit(celsius: i32) -> i32 {
    32 + (celsius as f64 / 0.5556) as i32
}

/// Acknowledgement returned by the message sink
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageAck {
    /// Number of body bytes received
    pub received: usize,
}
