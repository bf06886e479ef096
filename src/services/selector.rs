use std::collections::HashMap;

use crate::models::selection::{bucket_histogram, diversity_score};
use crate::models::{
    Bucket, Candidate, FilterSpec, Guardrail, ScoredCandidate, SelectionResult, SettingPreference,
};
use crate::services::weather_score::is_outdoor;

/// Selection always aims for exactly this many picks
pub const TARGET_PICKS: usize = 5;

/// No bucket may appear more than twice unless relaxation is required
pub const MAX_PER_BUCKET: usize = 2;

/// At most one food pick, ever
pub const FOOD_CAP: usize = 1;

/// Blend weights for the combined ranking score. Tunable via configuration;
/// the defaults favor relevance, then feasibility, then weather.
#[derive(Debug, Clone, Copy)]
pub struct SelectionWeights {
    pub relevance: f64,
    pub feasibility: f64,
    pub weather: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            relevance: 0.45,
            feasibility: 0.35,
            weather: 0.20,
        }
    }
}

impl SelectionWeights {
    /// Scales the weights to sum to 1 so combined scores stay in [0, 1].
    /// Degenerate input (all zeros, negatives) falls back to the defaults.
    pub fn normalized(self) -> Self {
        let (r, f, w) = (
            self.relevance.max(0.0),
            self.feasibility.max(0.0),
            self.weather.max(0.0),
        );
        let sum = r + f + w;
        if sum <= f64::EPSILON {
            return Self::default();
        }
        Self {
            relevance: r / sum,
            feasibility: f / sum,
            weather: w / sum,
        }
    }
}

/// How well a candidate matches the interpreted vibe, in [0, 1].
/// Deterministic: bucket membership dominates, then kind overlap, then
/// keyword hits, then setting alignment.
pub fn relevance_score(candidate: &Candidate, spec: &FilterSpec) -> f64 {
    let mut score = 0.0;

    if spec.buckets.contains(&candidate.bucket()) {
        score += 0.45;
    }

    let tags: Vec<String> = candidate.tags.iter().map(|t| t.to_lowercase()).collect();
    if !spec.kinds.is_empty() {
        let kind_hits = spec
            .kinds
            .iter()
            .filter(|k| {
                let k = k.to_lowercase();
                tags.iter().any(|t| t.contains(&k) || k.contains(t.as_str()))
            })
            .count();
        score += 0.30 * (kind_hits as f64 / spec.kinds.len() as f64).min(1.0);
    }

    if !spec.keywords.is_empty() {
        let name = candidate.name.to_lowercase();
        let keyword_hits = spec
            .keywords
            .iter()
            .filter(|k| {
                let k = k.to_lowercase();
                name.contains(&k) || tags.iter().any(|t| t.contains(&k))
            })
            .count();
        score += 0.15 * (keyword_hits as f64 / spec.keywords.len() as f64).min(1.0);
    }

    score += match spec.setting {
        SettingPreference::Either => 0.05,
        SettingPreference::Outdoor if is_outdoor(candidate) => 0.10,
        SettingPreference::Indoor if !is_outdoor(candidate) => 0.10,
        _ => 0.0,
    };

    score.clamp(0.0, 1.0)
}

/// The single ranking score, blended only here so the per-axis diagnostics
/// stay inspectable upstream
pub fn combined_score(scored: &ScoredCandidate, weights: SelectionWeights) -> f64 {
    let w = weights.normalized();
    (w.relevance * scored.relevance
        + w.feasibility * scored.feasibility.overall
        + w.weather * scored.weather.score)
        .clamp(0.0, 1.0)
}

/// Collapses the scored pool into at most five diverse, policy-compliant
/// picks.
///
/// Hard filters run first (travel bound, food policy, avoid list), then a
/// greedy descending-score pass under the two-per-bucket cap. When the cap
/// starves the pick list below five while five eligible candidates exist,
/// the cap is relaxed rather than returning short; the food cap is never
/// relaxed. Fewer than five survivors is a degraded result, flagged and
/// never padded.
pub fn select_five(
    pool: Vec<ScoredCandidate>,
    spec: &FilterSpec,
    weights: SelectionWeights,
) -> SelectionResult {
    let considered = pool.len();
    let mut guardrails = Vec::new();

    let mut dropped_by_travel = false;
    let mut dropped_food = false;

    let mut eligible: Vec<ScoredCandidate> = pool
        .into_iter()
        .filter(|sc| {
            if sc.travel_minutes > spec.max_travel_minutes {
                dropped_by_travel = true;
                return false;
            }
            if sc.candidate.is_food && (!spec.allows_food() || !sc.candidate.is_premium_food()) {
                dropped_food = true;
                return false;
            }
            let name = sc.candidate.name.to_lowercase();
            let avoided = spec.avoid.iter().any(|a| {
                let a = a.to_lowercase();
                !a.is_empty()
                    && (name.contains(&a)
                        || sc.candidate.tags.iter().any(|t| t.to_lowercase().contains(&a)))
            });
            !avoided
        })
        .collect();

    if dropped_by_travel {
        guardrails.push(Guardrail::TravelTimeClamped);
    }
    if dropped_food {
        guardrails.push(Guardrail::FoodCapApplied);
    }

    // deterministic order: combined score, then feasibility, then lower
    // travel, then id as the final stable tie-break
    eligible.sort_by(|a, b| {
        combined_score(b, weights)
            .partial_cmp(&combined_score(a, weights))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.feasibility
                    .overall
                    .partial_cmp(&a.feasibility.overall)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.travel_minutes.cmp(&b.travel_minutes))
            .then(a.candidate.id.cmp(&b.candidate.id))
    });

    let mut picks: Vec<ScoredCandidate> = Vec::with_capacity(TARGET_PICKS);
    let mut per_bucket: HashMap<Bucket, usize> = HashMap::new();
    let mut food_count = 0usize;
    let mut skipped: Vec<ScoredCandidate> = Vec::new();

    for sc in eligible {
        if picks.len() == TARGET_PICKS {
            break;
        }
        let bucket = sc.candidate.bucket();
        let bucket_full = per_bucket.get(&bucket).copied().unwrap_or(0) >= MAX_PER_BUCKET;
        let food_full = sc.candidate.is_food && food_count >= FOOD_CAP;

        if food_full {
            if !guardrails.contains(&Guardrail::FoodCapApplied) {
                guardrails.push(Guardrail::FoodCapApplied);
            }
            continue;
        }
        if bucket_full {
            skipped.push(sc);
            continue;
        }

        *per_bucket.entry(bucket).or_insert(0) += 1;
        if sc.candidate.is_food {
            food_count += 1;
        }
        picks.push(sc);
    }

    // relax the diversity cap before returning short of five
    if picks.len() < TARGET_PICKS && picks.len() + skipped.len() >= TARGET_PICKS {
        guardrails.push(Guardrail::DiversityRelaxed);
        for sc in skipped {
            if picks.len() == TARGET_PICKS {
                break;
            }
            if sc.candidate.is_food && food_count >= FOOD_CAP {
                continue;
            }
            if sc.candidate.is_food {
                food_count += 1;
            }
            picks.push(sc);
        }
    }

    let degraded = picks.len() < TARGET_PICKS;
    if degraded {
        tracing::warn!(
            picks = picks.len(),
            considered,
            "Degraded selection: pool too small after filters"
        );
    }

    SelectionResult {
        bucket_histogram: bucket_histogram(&picks),
        diversity_score: diversity_score(&picks),
        considered,
        guardrails,
        degraded,
        picks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeasibilityScore, GeoPoint, WeatherSuitability};

    fn scored(id: &str, tag: &str, relevance: f64, feasibility: f64, travel: u32) -> ScoredCandidate {
        scored_food(id, tag, relevance, feasibility, travel, false, 0.0, 0)
    }

    #[allow(clippy::too_many_arguments)]
    fn scored_food(
        id: &str,
        tag: &str,
        relevance: f64,
        feasibility: f64,
        travel: u32,
        is_food: bool,
        rating: f64,
        rating_count: u32,
    ) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate {
                id: id.to_string(),
                name: format!("Place {}", id),
                tags: vec![tag.to_string()],
                location: GeoPoint::new(50.0, 14.4),
                rating,
                rating_count,
                price_tier: if is_food { 3 } else { 1 },
                region: "local".to_string(),
                is_food,
            },
            relevance,
            feasibility: FeasibilityScore {
                popularity: feasibility,
                quality: feasibility,
                accessibility: feasibility,
                reliability: feasibility,
                overall: feasibility,
                reasons: vec![],
            },
            weather: WeatherSuitability {
                score: 0.8,
                hint: "18°C".to_string(),
            },
            distance_km: 2.0,
            travel_minutes: travel,
        }
    }

    fn spec() -> FilterSpec {
        FilterSpec {
            buckets: vec![Bucket::Nature, Bucket::Culture, Bucket::Wellness],
            max_travel_minutes: 120,
            ..Default::default()
        }
    }

    fn food_spec() -> FilterSpec {
        FilterSpec {
            avoid_food: false,
            ..spec()
        }
    }

    #[test]
    fn test_selects_exactly_five_unique() {
        let pool = vec![
            scored("a", "park", 0.9, 0.8, 10),
            scored("b", "museum", 0.8, 0.8, 10),
            scored("c", "spa", 0.7, 0.8, 10),
            scored("d", "garden", 0.6, 0.8, 10),
            scored("e", "gallery", 0.5, 0.8, 10),
            scored("f", "trail", 0.4, 0.8, 10),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 5);
        assert!(!result.degraded);

        let mut ids: Vec<&str> = result.picks.iter().map(|p| p.candidate.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_diversity_cap_holds_with_mixed_pool() {
        // three strong nature candidates; only two may make it
        let pool = vec![
            scored("n1", "park", 0.99, 0.9, 10),
            scored("n2", "garden", 0.98, 0.9, 10),
            scored("n3", "forest", 0.97, 0.9, 10),
            scored("c1", "museum", 0.5, 0.7, 10),
            scored("c2", "gallery", 0.4, 0.7, 10),
            scored("w1", "spa", 0.3, 0.7, 10),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 5);
        let nature = result
            .bucket_histogram
            .get(&Bucket::Nature)
            .copied()
            .unwrap_or(0);
        assert_eq!(nature, MAX_PER_BUCKET);
        assert!(!result.guardrails.contains(&Guardrail::DiversityRelaxed));
    }

    #[test]
    fn test_cap_relaxes_rather_than_returning_short() {
        let pool = vec![
            scored("n1", "park", 0.9, 0.9, 10),
            scored("n2", "garden", 0.8, 0.9, 10),
            scored("n3", "forest", 0.7, 0.9, 10),
            scored("n4", "park", 0.6, 0.9, 10),
            scored("n5", "garden", 0.5, 0.9, 10),
            scored("n6", "forest", 0.4, 0.9, 10),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 5);
        assert!(result.guardrails.contains(&Guardrail::DiversityRelaxed));
    }

    #[test]
    fn test_food_cap_never_relaxed() {
        let pool = vec![
            scored_food("f1", "restaurant", 0.9, 0.9, 10, true, 4.8, 900),
            scored_food("f2", "restaurant", 0.88, 0.9, 10, true, 4.7, 800),
            scored_food("f3", "bistro", 0.86, 0.9, 10, true, 4.6, 700),
            scored("a", "park", 0.5, 0.7, 10),
            scored("b", "museum", 0.4, 0.7, 10),
            scored("c", "spa", 0.3, 0.7, 10),
            scored("d", "garden", 0.2, 0.7, 10),
        ];
        let result = select_five(pool, &food_spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 5);
        let food_picks = result.picks.iter().filter(|p| p.candidate.is_food).count();
        assert_eq!(food_picks, FOOD_CAP);
        assert!(result.guardrails.contains(&Guardrail::FoodCapApplied));
    }

    #[test]
    fn test_food_dropped_when_spec_avoids_it() {
        let pool = vec![
            scored_food("f1", "restaurant", 0.99, 0.9, 10, true, 4.9, 2000),
            scored("a", "park", 0.5, 0.7, 10),
            scored("b", "museum", 0.4, 0.7, 10),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert!(result.picks.iter().all(|p| !p.candidate.is_food));
    }

    #[test]
    fn test_non_premium_food_dropped_even_when_allowed() {
        let pool = vec![
            // high rating but barely any reviews: not premium
            scored_food("f1", "restaurant", 0.99, 0.9, 10, true, 4.9, 5),
            scored("a", "park", 0.5, 0.7, 10),
        ];
        let result = select_five(pool, &food_spec(), SelectionWeights::default());
        assert!(result.picks.iter().all(|p| !p.candidate.is_food));
    }

    #[test]
    fn test_travel_bound_is_hard() {
        let pool = vec![
            scored("far", "park", 0.99, 0.9, 500),
            scored("near", "museum", 0.3, 0.5, 20),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 1);
        assert_eq!(result.picks[0].candidate.id, "near");
        assert!(result.guardrails.contains(&Guardrail::TravelTimeClamped));
    }

    #[test]
    fn test_degraded_result_is_flagged_not_padded() {
        let pool = vec![
            scored("a", "park", 0.9, 0.8, 10),
            scored("b", "museum", 0.8, 0.8, 10),
            scored("c", "spa", 0.7, 0.8, 10),
        ];
        let result = select_five(pool, &spec(), SelectionWeights::default());
        assert_eq!(result.picks.len(), 3);
        assert!(result.degraded);
    }

    #[test]
    fn test_avoid_list_filters_by_name_and_tag() {
        let mut spec = spec();
        spec.avoid = vec!["crowd".to_string()];
        let mut crowded = scored("a", "park", 0.9, 0.9, 10);
        crowded.candidate.name = "Crowded Square".to_string();
        let pool = vec![crowded, scored("b", "museum", 0.5, 0.7, 10)];
        let result = select_five(pool, &spec, SelectionWeights::default());
        assert_eq!(result.picks.len(), 1);
        assert_eq!(result.picks[0].candidate.id, "b");
    }

    #[test]
    fn test_tie_break_feasibility_then_travel() {
        // identical relevance and weather; b has higher feasibility
        let pool = vec![
            scored("a", "park", 0.8, 0.5, 10),
            scored("b", "museum", 0.8, 0.9, 10),
        ];
        let weights = SelectionWeights {
            relevance: 1.0,
            feasibility: 0.0,
            weather: 0.0,
        };
        let result = select_five(pool, &spec(), weights);
        assert_eq!(result.picks[0].candidate.id, "b");

        // identical everything except travel time
        let pool = vec![
            scored("slow", "park", 0.8, 0.5, 90),
            scored("fast", "garden", 0.8, 0.5, 15),
        ];
        let result = select_five(pool, &spec(), weights);
        assert_eq!(result.picks[0].candidate.id, "fast");
    }

    #[test]
    fn test_combined_score_in_range() {
        let sc = scored("a", "park", 1.0, 1.0, 10);
        let combined = combined_score(&sc, SelectionWeights::default());
        assert!((0.0..=1.0).contains(&combined));

        let zeroed = scored("z", "park", 0.0, 0.0, 10);
        assert!(combined_score(&zeroed, SelectionWeights::default()) >= 0.0);
    }

    #[test]
    fn test_relevance_rewards_bucket_match() {
        let spec = spec();
        let museum = scored("m", "museum", 0.0, 0.0, 10).candidate;
        let club = scored("c", "night_club", 0.0, 0.0, 10).candidate;
        assert!(relevance_score(&museum, &spec) > relevance_score(&club, &spec));
    }

    #[test]
    fn test_weights_normalize_degenerate_input() {
        let w = SelectionWeights {
            relevance: 0.0,
            feasibility: 0.0,
            weather: 0.0,
        }
        .normalized();
        let sum = w.relevance + w.feasibility + w.weather;
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
