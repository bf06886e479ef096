use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::selection::bucket_histogram;
use crate::models::{Blurb, CurationNarrative, NarrativeCluster, ScoredCandidate};
use crate::services::llm_gateway::LlmGateway;

/// Word-count band for generated blurbs
pub const BLURB_MIN_WORDS: usize = 8;
pub const BLURB_MAX_WORDS: usize = 40;

/// Superlative, price and booking language is contracted out of blurbs
const BANNED_PHRASES: &[&str] = &[
    "world-class",
    "best in",
    "must-see",
    "unmissable",
    "once-in-a-lifetime",
    "bucket list",
    "book now",
    "reserve",
    "booking",
    "ticket",
    "price",
    "discount",
    "cheap",
    "$",
    "€",
];

const NARRATIVE_SYSTEM: &str = r#"You write short, neutral blurbs for a day-plan of selected venues.
Reply with a single JSON object and nothing else:
{
  "blurbs": [ { "candidate_id": "...", "text": "8-40 words" }, ... one entry per venue ],
  "clusters": [ { "title": "...", "member_ids": ["..."] }, ... ],
  "diversity_note": "one sentence on the overall spread"
}
Use only the candidate ids you were given. No superlatives, no prices, no booking language.
Do not add fields. Do not wrap the object in markdown."#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNarrative {
    blurbs: Vec<RawBlurb>,
    #[serde(default)]
    clusters: Vec<RawCluster>,
    diversity_note: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlurb {
    candidate_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCluster {
    title: String,
    member_ids: Vec<String>,
}

/// Checks a model-produced narrative against the structural invariants:
/// one blurb per selected pick, every referenced id among the selected ids,
/// blurbs within the word band, no banned vocabulary. Anything off rejects
/// the whole narrative; the caller rebuilds deterministically.
pub fn validate_narrative(
    value: Value,
    picks: &[ScoredCandidate],
) -> Result<CurationNarrative, String> {
    let raw: RawNarrative =
        serde_json::from_value(value).map_err(|e| format!("schema violation: {}", e))?;

    let selected: HashSet<&str> = picks.iter().map(|p| p.candidate.id.as_str()).collect();

    if raw.blurbs.len() != picks.len() {
        return Err(format!(
            "expected {} blurbs, got {}",
            picks.len(),
            raw.blurbs.len()
        ));
    }

    let mut covered: HashSet<&str> = HashSet::new();
    for blurb in &raw.blurbs {
        if !selected.contains(blurb.candidate_id.as_str()) {
            return Err(format!("blurb references unknown id '{}'", blurb.candidate_id));
        }
        if !covered.insert(blurb.candidate_id.as_str()) {
            return Err(format!("duplicate blurb for id '{}'", blurb.candidate_id));
        }

        let words = blurb.text.split_whitespace().count();
        if !(BLURB_MIN_WORDS..=BLURB_MAX_WORDS).contains(&words) {
            return Err(format!(
                "blurb for '{}' has {} words, band is {}..{}",
                blurb.candidate_id, words, BLURB_MIN_WORDS, BLURB_MAX_WORDS
            ));
        }

        let text = blurb.text.to_lowercase();
        if let Some(banned) = BANNED_PHRASES.iter().find(|p| text.contains(&p.to_lowercase())) {
            return Err(format!(
                "blurb for '{}' contains banned language '{}'",
                blurb.candidate_id, banned
            ));
        }
    }

    for cluster in &raw.clusters {
        for member in &cluster.member_ids {
            if !selected.contains(member.as_str()) {
                return Err(format!(
                    "cluster '{}' references unknown id '{}'",
                    cluster.title, member
                ));
            }
        }
    }

    Ok(CurationNarrative {
        blurbs: raw
            .blurbs
            .into_iter()
            .map(|b| Blurb {
                candidate_id: b.candidate_id,
                text: b.text,
            })
            .collect(),
        clusters: raw
            .clusters
            .into_iter()
            .map(|c| NarrativeCluster {
                title: c.title,
                member_ids: c.member_ids,
            })
            .collect(),
        diversity_note: raw.diversity_note,
        generated: true,
    })
}

/// Deterministic narrative built straight from candidate fields: one cluster
/// over all picks, no generated prose. Satisfiable without a working model.
pub fn fallback_narrative(picks: &[ScoredCandidate]) -> CurationNarrative {
    let ids: Vec<String> = picks.iter().map(|p| p.candidate.id.clone()).collect();

    let blurbs = picks
        .iter()
        .map(|p| {
            let category = p
                .candidate
                .tags
                .first()
                .cloned()
                .unwrap_or_else(|| "activity".to_string());
            Blurb {
                candidate_id: p.candidate.id.clone(),
                text: format!("{} ({})", p.candidate.name, category),
            }
        })
        .collect();

    let themes = bucket_histogram(picks).len();
    CurationNarrative {
        blurbs,
        clusters: vec![NarrativeCluster {
            title: "Today's lineup".to_string(),
            member_ids: ids,
        }],
        diversity_note: format!("{} picks across {} themes", picks.len(), themes),
        generated: false,
    }
}

/// Produces a narrative for the picks: one model call, strictly validated,
/// with the deterministic fallback on any failure. Never errors.
pub async fn narrate(gateway: &LlmGateway, picks: &[ScoredCandidate]) -> CurationNarrative {
    if picks.is_empty() {
        return fallback_narrative(picks);
    }

    let venues: Vec<Value> = picks
        .iter()
        .map(|p| {
            json!({
                "candidate_id": p.candidate.id,
                "name": p.candidate.name,
                "tags": p.candidate.tags,
                "region": p.candidate.region,
            })
        })
        .collect();
    let user_payload = json!({ "venues": venues }).to_string();

    match gateway.complete_json(NARRATIVE_SYSTEM, &user_payload).await {
        Ok(value) => match validate_narrative(value, picks) {
            Ok(narrative) => narrative,
            Err(why) => {
                tracing::warn!(reason = %why, "Narrative failed validation, using fallback");
                fallback_narrative(picks)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Narrative call failed, using fallback");
            fallback_narrative(picks)
        }
    }
}
