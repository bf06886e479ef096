use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::ScoredCandidate;
use super::filter_spec::Bucket;

/// Guardrails applied while searching and selecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guardrail {
    RadiusClamped,
    TravelTimeClamped,
    FoodCapApplied,
    DiversityRelaxed,
}

/// The final outcome of selection: exactly five picks when the post-filter
/// pool allows it, fewer with `degraded` set when it does not. Never padded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub picks: Vec<ScoredCandidate>,
    /// Size of the scored pool before hard filters
    pub considered: usize,
    pub bucket_histogram: BTreeMap<Bucket, usize>,
    /// Distinct buckets over pick count, [0, 1]
    pub diversity_score: f64,
    pub guardrails: Vec<Guardrail>,
    pub degraded: bool,
}

impl SelectionResult {
    pub fn push_guardrail(&mut self, guardrail: Guardrail) {
        if !self.guardrails.contains(&guardrail) {
            self.guardrails.push(guardrail);
        }
    }
}

/// Counts picks per bucket
pub fn bucket_histogram(picks: &[ScoredCandidate]) -> BTreeMap<Bucket, usize> {
    let mut histogram = BTreeMap::new();
    for pick in picks {
        *histogram.entry(pick.candidate.bucket()).or_insert(0) += 1;
    }
    histogram
}

/// Distinct buckets over pick count; 0 for an empty pick list
pub fn diversity_score(picks: &[ScoredCandidate]) -> f64 {
    if picks.is_empty() {
        return 0.0;
    }
    bucket_histogram(picks).len() as f64 / picks.len() as f64
}
