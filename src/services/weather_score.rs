use crate::models::{Candidate, Forecast, WeatherSuitability};

/// Indoor venues never drop below this, whatever the sky is doing
const INDOOR_FLOOR: f64 = 0.85;

const OUTDOOR_BASE: f64 = 0.9;
const HEAVY_PRECIP_MM: f64 = 2.0;
const LIGHT_PRECIP_MM: f64 = 0.2;
const EXTREME_COLD_C: f64 = -5.0;
const EXTREME_HOT_C: f64 = 33.0;
const COLD_C: f64 = 3.0;
const STRONG_WIND_MS: f64 = 14.0;
const MILD_MIN_C: f64 = 15.0;
const MILD_MAX_C: f64 = 26.0;

/// Tags that put a candidate outdoors for weather purposes
const OUTDOOR_TAGS: &[&str] = &[
    "park",
    "trail",
    "hiking",
    "garden",
    "viewpoint",
    "lake",
    "beach",
    "river",
    "waterfall",
    "zipline",
    "nature",
    "forest",
    "national_park",
];

/// Tags that force an indoor classification even when an outdoor word also
/// matches (e.g. an indoor climbing gym)
const INDOOR_TAGS: &[&str] = &[
    "museum",
    "gallery",
    "theater",
    "theatre",
    "cinema",
    "spa",
    "sauna",
    "indoor",
    "aquarium",
    "escape_room",
    "bowling",
];

/// Whether this candidate is exposed to the weather
pub fn is_outdoor(candidate: &Candidate) -> bool {
    let tags: Vec<String> = candidate.tags.iter().map(|t| t.to_lowercase()).collect();
    if tags
        .iter()
        .any(|t| INDOOR_TAGS.iter().any(|it| t.contains(it)))
    {
        return false;
    }
    tags.iter()
        .any(|t| OUTDOOR_TAGS.iter().any(|ot| t.contains(ot)))
}

/// Scores how well the forecast suits a candidate. Pure function.
///
/// Indoor candidates floor at a high suitability; outdoor candidates are
/// penalized for precipitation, temperature extremes and strong wind, and
/// rewarded for clear, mild conditions.
pub fn score_weather(candidate: &Candidate, forecast: &Forecast) -> WeatherSuitability {
    let temp = forecast.temperature_c;
    let suffix = if forecast.estimated { " (estimated)" } else { "" };

    if !is_outdoor(candidate) {
        return WeatherSuitability {
            score: INDOOR_FLOOR,
            hint: format!("{:.0}°C outside, but this one is indoors{}", temp, suffix),
        };
    }

    let mut score = OUTDOOR_BASE;
    let mut condition = "clear skies";

    if forecast.precipitation_mm >= HEAVY_PRECIP_MM {
        score -= 0.5;
        condition = "heavy rain";
    } else if forecast.precipitation_mm >= LIGHT_PRECIP_MM {
        score -= 0.25;
        condition = "light rain";
    }

    if temp < EXTREME_COLD_C || temp > EXTREME_HOT_C {
        score -= 0.2;
        condition = if temp < EXTREME_COLD_C {
            "freezing"
        } else {
            "scorching"
        };
    } else if temp < COLD_C {
        score -= 0.1;
    }

    if forecast.wind_speed_ms >= STRONG_WIND_MS {
        score -= 0.1;
    }

    let clear_and_mild = forecast.precipitation_mm < LIGHT_PRECIP_MM
        && (MILD_MIN_C..=MILD_MAX_C).contains(&temp)
        && forecast.wind_speed_ms < STRONG_WIND_MS;
    if clear_and_mild {
        score += 0.1;
        condition = "clear and mild";
    }

    WeatherSuitability {
        score: score.clamp(0.0, 1.0),
        hint: format!("{:.0}°C, {}{}", temp, condition, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn candidate(tags: &[&str]) -> Candidate {
        Candidate {
            id: "c1".to_string(),
            name: "Place".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            location: GeoPoint::new(50.0, 14.4),
            rating: 4.2,
            rating_count: 200,
            price_tier: 1,
            region: "local".to_string(),
            is_food: false,
        }
    }

    fn forecast(temp: f64, precip: f64, wind: f64) -> Forecast {
        Forecast {
            temperature_c: temp,
            precipitation_mm: precip,
            wind_speed_ms: wind,
            estimated: false,
            retrieved_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_indoor_floors_high_in_a_storm() {
        let s = score_weather(&candidate(&["museum"]), &forecast(-2.0, 8.0, 20.0));
        assert!(s.score >= INDOOR_FLOOR);
    }

    #[test]
    fn test_indoor_tag_beats_outdoor_tag() {
        // an indoor pool hall tagged with both stays indoor
        assert!(!is_outdoor(&candidate(&["indoor", "park"])));
        assert!(is_outdoor(&candidate(&["park"])));
    }

    #[test]
    fn test_outdoor_penalized_for_rain() {
        let dry = score_weather(&candidate(&["trail"]), &forecast(18.0, 0.0, 3.0));
        let wet = score_weather(&candidate(&["trail"]), &forecast(18.0, 3.5, 3.0));
        assert!(dry.score > wet.score);
        assert!(wet.hint.contains("heavy rain"));
    }

    #[test]
    fn test_clear_mild_outdoor_scores_top() {
        let s = score_weather(&candidate(&["viewpoint"]), &forecast(21.0, 0.0, 2.0));
        assert_eq!(s.score, 1.0);
        assert!(s.hint.contains("21"));
    }

    #[test]
    fn test_score_clamped_under_pileup() {
        // heavy rain + freezing + gale still bottoms out at zero, not below
        let s = score_weather(&candidate(&["trail"]), &forecast(-15.0, 9.0, 25.0));
        assert!((0.0..=1.0).contains(&s.score));
    }

    #[test]
    fn test_hint_always_contains_temperature() {
        for f in [forecast(7.0, 0.0, 1.0), forecast(-3.0, 1.0, 5.0)] {
            let outdoor = score_weather(&candidate(&["garden"]), &f);
            let indoor = score_weather(&candidate(&["gallery"]), &f);
            assert!(outdoor.hint.contains("°C"));
            assert!(indoor.hint.contains("°C"));
        }
    }

    #[test]
    fn test_estimated_forecast_is_marked() {
        let mut f = forecast(18.0, 0.0, 2.0);
        f.estimated = true;
        let s = score_weather(&candidate(&["park"]), &f);
        assert!(s.hint.contains("estimated"));
    }
}
