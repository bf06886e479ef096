use serde::{Deserialize, Serialize};

use super::travel::MAX_TRAVEL_MINUTES;

/// Bounds on the interpreted query. A FilterSpec outside these is clamped,
/// never rejected.
pub const MIN_KINDS: usize = 3;
pub const MAX_KINDS: usize = 15;
pub const MAX_KEYWORDS: usize = 10;
pub const MIN_BUCKETS: usize = 1;
pub const MAX_BUCKETS: usize = 6;
pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_LOCAL_RADIUS_KM: f64 = 50.0;
pub const MAX_EXCURSION_RADIUS_KM: f64 = 250.0;
pub const MAX_PRICE_TIER: u8 = 4;

/// Minimum rating and price tier enforced when the vibe permits food, so only
/// premium food candidates survive downstream filtering
pub const FOOD_MIN_RATING: f64 = 4.3;
pub const FOOD_MIN_PRICE_TIER: u8 = 3;

/// Thematic category used for diversity accounting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Trails,
    Adrenaline,
    Nature,
    Water,
    Culture,
    Wellness,
    Nightlife,
    Food,
}

impl Bucket {
    pub const ALL: [Bucket; 8] = [
        Bucket::Trails,
        Bucket::Adrenaline,
        Bucket::Nature,
        Bucket::Water,
        Bucket::Culture,
        Bucket::Wellness,
        Bucket::Nightlife,
        Bucket::Food,
    ];

    /// Parses the snake_case name the language model is instructed to emit
    pub fn parse(s: &str) -> Option<Bucket> {
        match s.trim().to_lowercase().as_str() {
            "trails" => Some(Bucket::Trails),
            "adrenaline" => Some(Bucket::Adrenaline),
            "nature" => Some(Bucket::Nature),
            "water" => Some(Bucket::Water),
            "culture" => Some(Bucket::Culture),
            "wellness" => Some(Bucket::Wellness),
            "nightlife" => Some(Bucket::Nightlife),
            "food" => Some(Bucket::Food),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Chill,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingPreference {
    Indoor,
    Outdoor,
    Either,
}

/// The interpreted query. Structurally complete by construction: every field
/// has a safe default, and `sanitized()` clamps anything out of bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Candidate-type tags forwarded to the places provider
    pub kinds: Vec<String>,
    /// Free-text keywords forwarded to the places provider
    pub keywords: Vec<String>,
    /// Target buckets for diversity accounting
    pub buckets: Vec<Bucket>,
    pub radius_km: f64,
    pub max_travel_minutes: u32,
    pub time_of_day: Option<TimeOfDay>,
    pub setting: SettingPreference,
    pub energy: EnergyLevel,
    pub min_rating: f64,
    pub max_price_tier: u8,
    /// True unless the vibe is explicitly culinary
    pub avoid_food: bool,
    /// Things the user asked to avoid; matched against names and tags
    pub avoid: Vec<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            kinds: vec![
                "park".to_string(),
                "museum".to_string(),
                "viewpoint".to_string(),
            ],
            keywords: Vec::new(),
            buckets: vec![Bucket::Nature, Bucket::Culture],
            radius_km: 15.0,
            max_travel_minutes: 90,
            time_of_day: None,
            setting: SettingPreference::Either,
            energy: EnergyLevel::Medium,
            min_rating: 3.8,
            max_price_tier: 2,
            avoid_food: true,
            avoid: Vec::new(),
        }
    }
}

impl FilterSpec {
    /// Clamps every field into its documented bounds. Missing or degenerate
    /// values are filled from defaults, so the result is always usable.
    pub fn sanitized(mut self, max_radius_km: f64) -> Self {
        let defaults = FilterSpec::default();

        self.kinds.retain(|k| !k.trim().is_empty());
        self.kinds.truncate(MAX_KINDS);
        if self.kinds.len() < MIN_KINDS {
            for kind in &defaults.kinds {
                if self.kinds.len() >= MIN_KINDS {
                    break;
                }
                if !self.kinds.contains(kind) {
                    self.kinds.push(kind.clone());
                }
            }
        }

        self.keywords.retain(|k| !k.trim().is_empty());
        self.keywords.truncate(MAX_KEYWORDS);

        self.buckets.dedup();
        self.buckets.truncate(MAX_BUCKETS);
        if self.buckets.len() < MIN_BUCKETS {
            self.buckets = defaults.buckets.clone();
        }

        let radius_cap = max_radius_km.clamp(MIN_RADIUS_KM, MAX_EXCURSION_RADIUS_KM);
        self.radius_km = self.radius_km.clamp(MIN_RADIUS_KM, radius_cap);
        self.max_travel_minutes = self.max_travel_minutes.min(MAX_TRAVEL_MINUTES);

        self.min_rating = self.min_rating.clamp(0.0, 5.0);
        self.max_price_tier = self.max_price_tier.min(MAX_PRICE_TIER);

        self
    }

    pub fn allows_food(&self) -> bool {
        !self.avoid_food
    }
}
