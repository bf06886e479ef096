use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::filter_spec::{
    FOOD_MIN_PRICE_TIER, FOOD_MIN_RATING, MAX_BUCKETS, MAX_EXCURSION_RADIUS_KM, MAX_KINDS,
    MAX_LOCAL_RADIUS_KM, MIN_BUCKETS, MIN_KINDS,
};
use crate::models::{
    Bucket, EnergyLevel, FilterSpec, Guardrail, SettingPreference, TimeOfDay, TravelPolicy,
};
use crate::services::llm_gateway::LlmGateway;
use crate::services::search::allows_day_trip;

/// Accepted vibe text length
pub const VIBE_MIN_CHARS: usize = 3;
pub const VIBE_MAX_CHARS: usize = 500;

const INTERPRET_SYSTEM: &str = r#"You turn a short mood description into a search plan for local activities.
Reply with a single JSON object and nothing else:
{
  "kinds": [3-15 venue type tags, e.g. "hiking_trail", "museum", "spa"],
  "keywords": [0-10 free-text search words],
  "buckets": [1-6 of: "trails", "adrenaline", "nature", "water", "culture", "wellness", "nightlife", "food"],
  "radius_km": number,
  "max_travel_minutes": number,
  "time_of_day": "morning" | "afternoon" | "evening" | "night" | null,
  "setting": "indoor" | "outdoor" | "either",
  "energy": "chill" | "medium" | "high",
  "min_rating": number 0-5,
  "max_price_tier": integer 0-4,
  "avoid": [things the user wants to avoid]
}
Do not add fields. Do not wrap the object in markdown."#;

/// Which tier produced the FilterSpec
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretationTier {
    Model,
    ModelRetry,
    Keyword,
}

/// Outcome of interpretation: always a complete spec, never an error
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub spec: FilterSpec,
    pub tier: InterpretationTier,
    pub guardrails: Vec<Guardrail>,
}

/// Raw model output. Strict on structure: unknown fields and wrong types are
/// schema violations that trigger the retry tier.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilterSpec {
    kinds: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    buckets: Vec<String>,
    #[serde(default)]
    radius_km: Option<f64>,
    #[serde(default)]
    max_travel_minutes: Option<u32>,
    #[serde(default)]
    time_of_day: Option<String>,
    #[serde(default)]
    setting: Option<String>,
    #[serde(default)]
    energy: Option<String>,
    #[serde(default)]
    min_rating: Option<f64>,
    #[serde(default)]
    max_price_tier: Option<u8>,
    #[serde(default)]
    avoid: Vec<String>,
}

const FOOD_TRIGGERS: &[&str] = &[
    "food",
    "eat",
    "restaurant",
    "dinner",
    "lunch",
    "brunch",
    "culinary",
    "tasting",
    "foodie",
    "gastro",
    "wine",
    "cuisine",
];

const OUTDOOR_CUES: &[&str] = &[
    "hike", "trail", "outdoor", "outside", "nature", "forest", "lake", "mountain", "fresh air",
    "sun", "walk", "bike", "climb",
];

const INDOOR_CUES: &[&str] = &[
    "museum", "indoor", "gallery", "cozy", "rainy", "spa", "cinema", "theater", "inside",
];

const HIGH_ENERGY_CUES: &[&str] = &[
    "adrenaline",
    "extreme",
    "party",
    "wild",
    "intense",
    "rush",
    "action",
    "crazy",
];

const CHILL_CUES: &[&str] = &[
    "chill", "calm", "relax", "slow", "quiet", "peaceful", "unwind", "lazy", "cozy",
];

/// Interprets a vibe into a FilterSpec through three tiers: model call,
/// model retry with the validation failure echoed back, then a deterministic
/// keyword matcher. Never fails; the worst case is a fully defaulted spec.
pub async fn interpret_vibe(
    gateway: &LlmGateway,
    vibe: &str,
    policy: &TravelPolicy,
) -> Interpretation {
    let user_payload = json!({
        "vibe": vibe,
        "max_travel_minutes": policy.max_travel_minutes,
        "excursions_allowed": policy.allow_excursions,
        "duration_hours": policy.duration_hours,
    })
    .to_string();

    match gateway.complete_json(INTERPRET_SYSTEM, &user_payload).await {
        Ok(value) => match validate(value, vibe, policy) {
            Ok((spec, guardrails)) => {
                return Interpretation {
                    spec,
                    tier: InterpretationTier::Model,
                    guardrails,
                }
            }
            Err(why) => {
                tracing::warn!(reason = %why, "Model spec failed validation, retrying with echo");
                let amended = format!(
                    "{}\n\nYour previous reply was rejected: {}. Send a corrected JSON object.",
                    INTERPRET_SYSTEM, why
                );
                if let Ok(value) = gateway.complete_json(&amended, &user_payload).await {
                    if let Ok((spec, guardrails)) = validate(value, vibe, policy) {
                        return Interpretation {
                            spec,
                            tier: InterpretationTier::ModelRetry,
                            guardrails,
                        };
                    }
                }
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Model interpretation call failed, retrying once");
            if let Ok(value) = gateway.complete_json(INTERPRET_SYSTEM, &user_payload).await {
                if let Ok((spec, guardrails)) = validate(value, vibe, policy) {
                    return Interpretation {
                        spec,
                        tier: InterpretationTier::ModelRetry,
                        guardrails,
                    };
                }
            }
        }
    }

    tracing::info!("Falling back to keyword interpretation");
    let (spec, guardrails) = keyword_spec(vibe, policy);
    Interpretation {
        spec,
        tier: InterpretationTier::Keyword,
        guardrails,
    }
}

fn parse_variant<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_value(Value::String(s.trim().to_lowercase())).ok()
}

/// Checks the model payload against the schema and assembles a clamped
/// FilterSpec. Structural problems are errors (echoed into the retry);
/// out-of-range continuous values are clamped with a guardrail instead.
fn validate(
    value: Value,
    vibe: &str,
    policy: &TravelPolicy,
) -> Result<(FilterSpec, Vec<Guardrail>), String> {
    let raw: RawFilterSpec =
        serde_json::from_value(value).map_err(|e| format!("schema violation: {}", e))?;

    if raw.kinds.len() < MIN_KINDS || raw.kinds.len() > MAX_KINDS {
        return Err(format!(
            "kinds must have {}..{} entries, got {}",
            MIN_KINDS,
            MAX_KINDS,
            raw.kinds.len()
        ));
    }

    let mut buckets = Vec::new();
    for name in &raw.buckets {
        let bucket = Bucket::parse(name).ok_or_else(|| format!("unknown bucket '{}'", name))?;
        if !buckets.contains(&bucket) {
            buckets.push(bucket);
        }
    }
    if buckets.len() < MIN_BUCKETS || buckets.len() > MAX_BUCKETS {
        return Err(format!(
            "buckets must have {}..{} distinct entries, got {}",
            MIN_BUCKETS,
            MAX_BUCKETS,
            buckets.len()
        ));
    }

    let time_of_day = match &raw.time_of_day {
        Some(s) => Some(
            parse_variant::<TimeOfDay>(s).ok_or_else(|| format!("unknown time_of_day '{}'", s))?,
        ),
        None => None,
    };
    let setting = match &raw.setting {
        Some(s) => {
            parse_variant::<SettingPreference>(s).ok_or_else(|| format!("unknown setting '{}'", s))?
        }
        None => SettingPreference::Either,
    };
    let energy = match &raw.energy {
        Some(s) => parse_variant::<EnergyLevel>(s).ok_or_else(|| format!("unknown energy '{}'", s))?,
        None => EnergyLevel::Medium,
    };

    let mut guardrails = Vec::new();
    let radius_cap = if allows_day_trip(policy) {
        MAX_EXCURSION_RADIUS_KM
    } else {
        MAX_LOCAL_RADIUS_KM
    };

    let defaults = FilterSpec::default();
    let requested_radius = raw.radius_km.unwrap_or(defaults.radius_km);
    if requested_radius > radius_cap {
        guardrails.push(Guardrail::RadiusClamped);
    }

    let requested_travel = raw.max_travel_minutes.unwrap_or(policy.max_travel_minutes);
    if requested_travel > policy.max_travel_minutes {
        guardrails.push(Guardrail::TravelTimeClamped);
    }

    let mut spec = FilterSpec {
        kinds: raw.kinds,
        keywords: raw.keywords,
        buckets,
        radius_km: requested_radius,
        max_travel_minutes: requested_travel.min(policy.max_travel_minutes),
        time_of_day,
        setting,
        energy,
        min_rating: raw.min_rating.unwrap_or(defaults.min_rating),
        max_price_tier: raw.max_price_tier.unwrap_or(defaults.max_price_tier),
        avoid_food: true,
        avoid: raw.avoid,
    };

    apply_food_policy(&mut spec, vibe);
    Ok((spec.sanitized(radius_cap), guardrails))
}

/// Food stays off unless the text itself asks for it; when it is on, only
/// premium food may pass downstream, so the floor and the cap move together
fn apply_food_policy(spec: &mut FilterSpec, vibe: &str) {
    let text = vibe.to_lowercase();
    let culinary = FOOD_TRIGGERS.iter().any(|t| text.contains(t));

    spec.avoid_food = !culinary;
    if culinary {
        if !spec.buckets.contains(&Bucket::Food) && spec.buckets.len() < MAX_BUCKETS {
            spec.buckets.push(Bucket::Food);
        }
        spec.min_rating = spec.min_rating.max(FOOD_MIN_RATING);
        spec.max_price_tier = spec.max_price_tier.max(FOOD_MIN_PRICE_TIER);
    } else {
        spec.buckets.retain(|b| *b != Bucket::Food);
        if spec.buckets.is_empty() {
            spec.buckets = FilterSpec::default().buckets;
        }
    }
}

fn kinds_for_bucket(bucket: Bucket) -> &'static [&'static str] {
    match bucket {
        Bucket::Trails => &["hiking_trail", "trailhead", "forest"],
        Bucket::Adrenaline => &["climbing", "adventure_park", "karting"],
        Bucket::Nature => &["park", "garden", "nature_reserve"],
        Bucket::Water => &["lake", "swimming", "riverside"],
        Bucket::Culture => &["museum", "gallery", "historic_site"],
        Bucket::Wellness => &["spa", "sauna", "thermal_bath"],
        Bucket::Nightlife => &["bar", "club", "live_music"],
        Bucket::Food => &["restaurant", "bistro", "winery"],
    }
}

/// Deterministic keyword matcher: inspects the text for known vocabulary and
/// assembles a spec from pattern hits, defaulting every unset field
pub fn keyword_spec(vibe: &str, policy: &TravelPolicy) -> (FilterSpec, Vec<Guardrail>) {
    let text = vibe.to_lowercase();
    let hit = |cues: &[&str]| cues.iter().any(|c| text.contains(c));

    let mut buckets = Vec::new();
    let push = |b: Bucket, buckets: &mut Vec<Bucket>| {
        if !buckets.contains(&b) && buckets.len() < MAX_BUCKETS {
            buckets.push(b);
        }
    };
    if hit(&["trail", "hike", "hiking", "trek"]) {
        push(Bucket::Trails, &mut buckets);
    }
    if hit(HIGH_ENERGY_CUES) {
        push(Bucket::Adrenaline, &mut buckets);
    }
    if hit(&["lake", "swim", "beach", "river", "water"]) {
        push(Bucket::Water, &mut buckets);
    }
    if hit(&["culture", "museum", "history", "art", "gallery", "castle"]) {
        push(Bucket::Culture, &mut buckets);
    }
    if hit(&["spa", "wellness", "sauna", "massage", "unwind"]) {
        push(Bucket::Wellness, &mut buckets);
    }
    if hit(&["party", "bar", "club", "nightlife", "drinks"]) {
        push(Bucket::Nightlife, &mut buckets);
    }
    if hit(&["nature", "forest", "park", "green", "fresh air"]) {
        push(Bucket::Nature, &mut buckets);
    }
    if buckets.is_empty() {
        buckets = FilterSpec::default().buckets;
    }

    let kinds: Vec<String> = buckets
        .iter()
        .flat_map(|b| kinds_for_bucket(*b).iter().map(|k| k.to_string()))
        .collect();

    let energy = if hit(HIGH_ENERGY_CUES) {
        EnergyLevel::High
    } else if hit(CHILL_CUES) {
        EnergyLevel::Chill
    } else {
        EnergyLevel::Medium
    };

    let outdoor = hit(OUTDOOR_CUES);
    let indoor = hit(INDOOR_CUES);
    let setting = match (outdoor, indoor) {
        (true, false) => SettingPreference::Outdoor,
        (false, true) => SettingPreference::Indoor,
        _ => SettingPreference::Either,
    };

    let time_of_day = if hit(&["morning", "sunrise", "breakfast"]) {
        Some(TimeOfDay::Morning)
    } else if hit(&["afternoon"]) {
        Some(TimeOfDay::Afternoon)
    } else if hit(&["evening", "sunset"]) {
        Some(TimeOfDay::Evening)
    } else if hit(&["night", "late", "midnight"]) {
        Some(TimeOfDay::Night)
    } else {
        None
    };

    let day_trip = allows_day_trip(policy);
    let radius_cap = if day_trip {
        MAX_EXCURSION_RADIUS_KM
    } else {
        MAX_LOCAL_RADIUS_KM
    };
    let radius_km = if day_trip {
        MAX_EXCURSION_RADIUS_KM
    } else if hit(&["nearby", "close", "around the corner", "walking distance"]) {
        8.0
    } else {
        FilterSpec::default().radius_km
    };

    let mut spec = FilterSpec {
        kinds,
        keywords: Vec::new(),
        buckets,
        radius_km,
        max_travel_minutes: policy.max_travel_minutes,
        time_of_day,
        setting,
        energy,
        ..Default::default()
    };

    apply_food_policy(&mut spec, vibe);
    (spec.sanitized(radius_cap), Vec::new())
}
