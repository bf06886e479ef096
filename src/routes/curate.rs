use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{GeoPoint, TravelPolicy},
    routes::AppState,
    services::curation::{CurationDiagnostics, CurationOutcome},
};

#[derive(Debug, Deserialize)]
pub struct CurateRequest {
    pub vibe: String,
    pub origin: GeoPoint,
    #[serde(default = "TravelPolicy::local")]
    pub travel: TravelPolicy,
}

/// Handler for the curation endpoint
pub async fn curate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurateRequest>,
) -> AppResult<Json<CurationOutcome>> {
    tracing::info!(
        vibe_chars = request.vibe.chars().count(),
        excursions = request.travel.allow_excursions,
        "Processing curation request"
    );

    let outcome = state
        .curation
        .curate(&request.vibe, request.origin, &request.travel)
        .await?;

    Ok(Json(outcome))
}

/// Handler for the diagnostic endpoint: interpreted spec plus per-candidate
/// score breakdowns
pub async fn diagnostics(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurateRequest>,
) -> AppResult<Json<CurationDiagnostics>> {
    let diagnostics = state
        .curation
        .diagnose(&request.vibe, request.origin, &request.travel)
        .await?;

    Ok(Json(diagnostics))
}
