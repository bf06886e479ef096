use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average road speed between regions (highway-dominated legs)
pub const INTER_REGION_SPEED_KMH: f64 = 70.0;

/// Assumed average speed for the local leg from a search center to a venue
pub const LOCAL_SPEED_KMH: f64 = 30.0;

/// Hard ceiling on one-way travel for any candidate
pub const MAX_TRAVEL_MINUTES: u32 = 720;

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point, in kilometers (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// Converts a road distance into estimated travel minutes at the given speed
pub fn travel_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if speed_kmh <= 0.0 {
        return MAX_TRAVEL_MINUTES;
    }
    (distance_km / speed_kmh * 60.0).round() as u32
}

/// Travel constraints attached to a single curation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPolicy {
    /// Maximum acceptable one-way travel time to any pick
    pub max_travel_minutes: u32,
    /// Whether searching beyond the local area is permitted at all
    pub allow_excursions: bool,
    /// Total time the user has available, in hours
    pub duration_hours: f32,
}

impl TravelPolicy {
    /// A conservative default: stay local, a couple of hours available
    pub fn local() -> Self {
        Self {
            max_travel_minutes: 45,
            allow_excursions: false,
            duration_hours: 3.0,
        }
    }
}

/// A known regional destination usable as a secondary search center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionHub {
    pub label: String,
    pub location: GeoPoint,
}
