use serde::{Deserialize, Serialize};

/// One short description attached to a selected pick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blurb {
    pub candidate_id: String,
    pub text: String,
}

/// A thematic grouping over the selected picks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeCluster {
    pub title: String,
    pub member_ids: Vec<String>,
}

/// Narrative layer over the five picks. Every id it mentions is guaranteed to
/// be one of the selected candidate ids; that is validated, not assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationNarrative {
    pub blurbs: Vec<Blurb>,
    pub clusters: Vec<NarrativeCluster>,
    pub diversity_note: String,
    /// False when this is the deterministic fallback
    pub generated: bool,
}
