use crate::models::{Candidate, FeasibilityScore};

const W_POPULARITY: f64 = 0.3;
const W_QUALITY: f64 = 0.3;
const W_ACCESSIBILITY: f64 = 0.2;
const W_RELIABILITY: f64 = 0.2;

const ACCESSIBILITY_BASELINE: f64 = 0.5;

/// Category tags that mark a venue as tourist-oriented, i.e. set up to
/// receive visitors without local knowledge
const TOURIST_TAGS: &[&str] = &[
    "tourist_attraction",
    "landmark",
    "viewpoint",
    "museum",
    "national_park",
    "visitor_center",
];

/// Scores how confidently a candidate can be recommended as a real, good,
/// accessible choice. Pure function: no I/O, no side effects.
///
/// Review volume is a first-class input, not just average rating. A place
/// nobody has validated cannot score as reliable no matter how it is rated,
/// which keeps a single 5-star/1-review outlier out of the top ranks.
pub fn score_feasibility(candidate: &Candidate) -> FeasibilityScore {
    let mut reasons = Vec::new();

    let popularity = match candidate.rating_count {
        n if n >= 1000 => 1.0,
        n if n >= 500 => 0.8,
        n if n >= 100 => 0.6,
        n if n >= 20 => 0.4,
        _ => 0.2,
    };
    if candidate.rating_count >= 500 {
        reasons.push(format!(
            "Validated by {} reviews",
            candidate.rating_count
        ));
    } else if candidate.rating_count < 20 {
        reasons.push("Very few reviews, treat as unproven".to_string());
    }

    let quality = match candidate.rating {
        r if r >= 4.5 => 1.0,
        r if r >= 4.0 => 0.8,
        r if r >= 3.5 => 0.6,
        r if r >= 3.0 => 0.4,
        _ => 0.2,
    };
    if candidate.rating >= 4.5 {
        reasons.push(format!("Outstanding rating ({:.1})", candidate.rating));
    } else if candidate.rating < 3.0 && candidate.rating_count > 0 {
        reasons.push(format!("Weak rating ({:.1})", candidate.rating));
    }

    let mut accessibility = ACCESSIBILITY_BASELINE;
    let tourist_oriented = candidate
        .tags
        .iter()
        .any(|t| TOURIST_TAGS.iter().any(|tt| t.to_lowercase().contains(tt)));
    if tourist_oriented {
        accessibility += 0.2;
        reasons.push("Tourist-oriented, easy to visit unprepared".to_string());
    }
    if candidate.rating_count >= 1000 {
        // heavily visited places are de facto reachable
        accessibility += 0.2;
    }
    if candidate.price_tier == 0 {
        accessibility += 0.1;
        reasons.push("Free to enter".to_string());
    }
    let accessibility = accessibility.min(1.0);

    // reliability needs volume AND quality at the same time
    let reliability = if candidate.rating_count >= 500 && candidate.rating >= 4.3 {
        1.0
    } else if candidate.rating_count >= 100 && candidate.rating >= 4.0 {
        0.7
    } else if candidate.rating_count >= 20 && candidate.rating >= 3.5 {
        0.4
    } else {
        0.1
    };
    if reliability >= 1.0 {
        reasons.push("Consistently well reviewed at volume".to_string());
    }

    let overall = (W_POPULARITY * popularity
        + W_QUALITY * quality
        + W_ACCESSIBILITY * accessibility
        + W_RELIABILITY * reliability)
        .clamp(0.0, 1.0);

    FeasibilityScore {
        popularity,
        quality,
        accessibility,
        reliability,
        overall,
        reasons,
    }
}
