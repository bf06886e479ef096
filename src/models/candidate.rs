use serde::{Deserialize, Serialize};

use super::filter_spec::Bucket;
use super::travel::GeoPoint;
use super::weather::WeatherSuitability;

/// Tags that mark a venue as a food place
const FOOD_TAGS: &[&str] = &[
    "restaurant",
    "cafe",
    "bar",
    "bakery",
    "bistro",
    "food",
    "winery",
    "brewery",
];

/// A food candidate counts as premium only with proven quality at volume
pub const PREMIUM_FOOD_MIN_RATING: f64 = 4.5;
pub const PREMIUM_FOOD_MIN_REVIEWS: u32 = 100;
pub const PREMIUM_FOOD_MIN_PRICE_TIER: u8 = 2;

/// A venue or activity merged from provider responses. Created transiently
/// per request; identity is the provider-stable `id`, used for dedup across
/// search centers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub location: GeoPoint,
    pub rating: f64,
    pub rating_count: u32,
    /// 0 (free) through 4 (splurge)
    pub price_tier: u8,
    /// Label of the search center that produced this candidate
    pub region: String,
    pub is_food: bool,
}

impl Candidate {
    /// Thematic bucket for diversity accounting, derived from tags
    pub fn bucket(&self) -> Bucket {
        if self.is_food {
            return Bucket::Food;
        }
        for tag in &self.tags {
            let t = tag.to_lowercase();
            let bucket = if t.contains("trail") || t.contains("hik") {
                Some(Bucket::Trails)
            } else if t.contains("climb")
                || t.contains("raft")
                || t.contains("zipline")
                || t.contains("kart")
                || t.contains("adventure")
                || t.contains("bungee")
            {
                Some(Bucket::Adrenaline)
            } else if t.contains("lake")
                || t.contains("beach")
                || t.contains("pool")
                || t.contains("river")
                || t.contains("aqua")
            {
                Some(Bucket::Water)
            } else if t.contains("park")
                || t.contains("garden")
                || t.contains("forest")
                || t.contains("nature")
                || t.contains("waterfall")
            {
                Some(Bucket::Nature)
            } else if t.contains("spa")
                || t.contains("sauna")
                || t.contains("thermal")
                || t.contains("wellness")
                || t.contains("yoga")
            {
                Some(Bucket::Wellness)
            } else if t.contains("club")
                || t.contains("nightlife")
                || t.contains("live_music")
                || t.contains("pub")
            {
                Some(Bucket::Nightlife)
            } else if t.contains("museum")
                || t.contains("gallery")
                || t.contains("castle")
                || t.contains("historic")
                || t.contains("theater")
                || t.contains("theatre")
                || t.contains("monument")
                || t.contains("landmark")
                || t.contains("attraction")
            {
                Some(Bucket::Culture)
            } else {
                None
            };
            if let Some(b) = bucket {
                return b;
            }
        }
        Bucket::Culture
    }

    /// High rating at volume, at a non-trivial price tier
    pub fn is_premium_food(&self) -> bool {
        self.is_food
            && self.rating >= PREMIUM_FOOD_MIN_RATING
            && self.rating_count >= PREMIUM_FOOD_MIN_REVIEWS
            && self.price_tier >= PREMIUM_FOOD_MIN_PRICE_TIER
    }
}

/// Raw venue payload from the places provider. Loosely typed on purpose;
/// mapped into `Candidate` at the boundary and never passed further.
/// Serialize is for the provider result cache, which stores raw payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPlace {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub price_level: Option<u8>,
}

impl ApiPlace {
    /// Maps the provider payload into the strict internal type, tagging it
    /// with the region label of the search center that produced it
    pub fn into_candidate(self, region: &str) -> Candidate {
        let is_food = self
            .types
            .iter()
            .any(|t| FOOD_TAGS.iter().any(|f| t.to_lowercase().contains(f)));

        Candidate {
            id: self.place_id,
            name: self.name,
            tags: self.types,
            location: GeoPoint::new(self.lat, self.lon),
            rating: self.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            rating_count: self.user_ratings_total.unwrap_or(0),
            price_tier: self.price_level.unwrap_or(0).min(4),
            region: region.to_string(),
            is_food,
        }
    }
}

/// Feasibility verdict for one candidate. All components are within [0, 1];
/// reasons are human-readable and carried through to diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityScore {
    pub popularity: f64,
    pub quality: f64,
    pub accessibility: f64,
    pub reliability: f64,
    pub overall: f64,
    pub reasons: Vec<String>,
}

/// A candidate with all three score axes attached. Scores stay independent
/// here; combination into a single ranking happens only at selection time so
/// each axis remains inspectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Vibe-relevance, [0, 1]
    pub relevance: f64,
    pub feasibility: FeasibilityScore,
    pub weather: WeatherSuitability,
    /// Great-circle distance from the request origin, km
    pub distance_km: f64,
    /// Estimated one-way travel time from the request origin
    pub travel_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(types: &[&str]) -> ApiPlace {
        ApiPlace {
            place_id: "p1".to_string(),
            name: "Spot".to_string(),
            types: types.iter().map(|s| s.to_string()).collect(),
            lat: 50.0,
            lon: 14.4,
            rating: Some(4.6),
            user_ratings_total: Some(320),
            price_level: Some(2),
        }
    }

    #[test]
    fn test_into_candidate_detects_food() {
        let c = place(&["restaurant", "point_of_interest"]).into_candidate("local");
        assert!(c.is_food);
        assert_eq!(c.bucket(), Bucket::Food);
        assert_eq!(c.region, "local");
    }

    #[test]
    fn test_into_candidate_defaults_missing_fields() {
        let mut p = place(&["museum"]);
        p.rating = None;
        p.user_ratings_total = None;
        p.price_level = None;
        let c = p.into_candidate("local");
        assert_eq!(c.rating, 0.0);
        assert_eq!(c.rating_count, 0);
        assert_eq!(c.price_tier, 0);
        assert!(!c.is_food);
    }

    #[test]
    fn test_into_candidate_clamps_rating() {
        let mut p = place(&["park"]);
        p.rating = Some(11.0);
        p.price_level = Some(9);
        let c = p.into_candidate("local");
        assert_eq!(c.rating, 5.0);
        assert_eq!(c.price_tier, 4);
    }

    #[test]
    fn test_bucket_classification() {
        assert_eq!(
            place(&["hiking_trail"]).into_candidate("x").bucket(),
            Bucket::Trails
        );
        assert_eq!(
            place(&["art_gallery"]).into_candidate("x").bucket(),
            Bucket::Culture
        );
        assert_eq!(
            place(&["spa"]).into_candidate("x").bucket(),
            Bucket::Wellness
        );
        assert_eq!(
            place(&["night_club"]).into_candidate("x").bucket(),
            Bucket::Nightlife
        );
        // unmatched tags land in culture
        assert_eq!(
            place(&["mystery"]).into_candidate("x").bucket(),
            Bucket::Culture
        );
    }

    #[test]
    fn test_premium_food_requires_volume_and_price() {
        let mut p = place(&["restaurant"]);
        p.rating = Some(4.8);
        p.user_ratings_total = Some(12);
        let c = p.into_candidate("local");
        // stellar rating, nowhere near enough reviews
        assert!(!c.is_premium_food());

        let mut p = place(&["restaurant"]);
        p.rating = Some(4.7);
        p.user_ratings_total = Some(800);
        p.price_level = Some(3);
        assert!(p.into_candidate("local").is_premium_food());
    }
}
