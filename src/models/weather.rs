use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-range forecast snapshot at the request origin
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Forecast {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub wind_speed_ms: f64,
    /// True when this is the neutral stand-in rather than provider data
    pub estimated: bool,
    pub retrieved_at: DateTime<Utc>,
}

impl Forecast {
    /// Neutral conditions used when the forecast provider is unavailable.
    /// Scoring still runs; hints mark the values as estimates.
    pub fn neutral() -> Self {
        Self {
            temperature_c: 18.0,
            precipitation_mm: 0.0,
            wind_speed_ms: 2.0,
            estimated: true,
            retrieved_at: Utc::now(),
        }
    }
}

/// Weather-suitability verdict for one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSuitability {
    /// Always within [0, 1]
    pub score: f64,
    /// Short display hint, always containing the temperature
    pub hint: String,
}
