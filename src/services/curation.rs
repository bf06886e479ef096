use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::db::ActivityStore;
use crate::error::{AppError, AppResult};
use crate::models::travel::{travel_minutes, LOCAL_SPEED_KMH};
use crate::models::{
    CurationNarrative, FilterSpec, Forecast, GeoPoint, RegionHub, ScoredCandidate, SelectionResult,
    TravelPolicy,
};
use crate::services::feasibility::score_feasibility;
use crate::services::interpreter::{
    interpret_vibe, Interpretation, InterpretationTier, VIBE_MAX_CHARS, VIBE_MIN_CHARS,
};
use crate::services::llm_gateway::LlmGateway;
use crate::services::narrative::narrate;
use crate::services::search::{fan_out, plan_centers, RoutedCandidate, ORIGIN_REGION};
use crate::services::selector::{relevance_score, select_five, SelectionWeights};
use crate::services::providers::{ForecastProvider, PlacesProvider};
use crate::services::weather_score::score_weather;

/// The full curation pipeline, wired once at startup and shared by every
/// request: interpretation, fan-out, scoring, selection, narrative.
#[derive(Clone)]
pub struct CurationService {
    places: Arc<dyn PlacesProvider>,
    forecast: Arc<dyn ForecastProvider>,
    llm: LlmGateway,
    hubs: Vec<RegionHub>,
    store: Option<ActivityStore>,
    weights: SelectionWeights,
}

/// What `curate` hands back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct CurationOutcome {
    pub selection: SelectionResult,
    pub narrative: CurationNarrative,
}

/// The diagnostic view: the interpreted spec and every intermediate score,
/// for debugging and test harnesses
#[derive(Debug, Clone, Serialize)]
pub struct CurationDiagnostics {
    pub spec: FilterSpec,
    pub interpretation_tier: InterpretationTier,
    pub centers: Vec<String>,
    pub forecast: Forecast,
    pub candidates: Vec<ScoredCandidate>,
    pub selection: SelectionResult,
}

struct Assembled {
    interpretation: Interpretation,
    forecast: Forecast,
    center_labels: Vec<String>,
    scored: Vec<ScoredCandidate>,
}

impl CurationService {
    pub fn new(
        places: Arc<dyn PlacesProvider>,
        forecast: Arc<dyn ForecastProvider>,
        llm: LlmGateway,
        hubs: Vec<RegionHub>,
        store: Option<ActivityStore>,
        weights: SelectionWeights,
    ) -> Self {
        Self {
            places,
            forecast,
            llm,
            hubs,
            store,
            weights,
        }
    }

    /// Runs the pipeline and collapses it into the final five picks plus a
    /// narrative. The only caller-visible error is invalid vibe text; every
    /// upstream failure degrades to a documented fallback instead.
    pub async fn curate(
        &self,
        vibe: &str,
        origin: GeoPoint,
        policy: &TravelPolicy,
    ) -> AppResult<CurationOutcome> {
        let started = Instant::now();
        let assembled = self.assemble(vibe, origin, policy).await?;

        let mut selection = select_five(assembled.scored, &assembled.interpretation.spec, self.weights);
        for guardrail in &assembled.interpretation.guardrails {
            selection.push_guardrail(*guardrail);
        }

        let narrative = narrate(&self.llm, &selection.picks).await;

        tracing::info!(
            duration_ms = started.elapsed().as_millis() as u64,
            picks = selection.picks.len(),
            considered = selection.considered,
            degraded = selection.degraded,
            tier = ?assembled.interpretation.tier,
            "Curation completed"
        );

        Ok(CurationOutcome {
            selection,
            narrative,
        })
    }

    /// Same pipeline, but exposes the interpreted spec and the per-candidate
    /// score breakdowns instead of just the result
    pub async fn diagnose(
        &self,
        vibe: &str,
        origin: GeoPoint,
        policy: &TravelPolicy,
    ) -> AppResult<CurationDiagnostics> {
        let assembled = self.assemble(vibe, origin, policy).await?;

        let mut selection = select_five(
            assembled.scored.clone(),
            &assembled.interpretation.spec,
            self.weights,
        );
        for guardrail in &assembled.interpretation.guardrails {
            selection.push_guardrail(*guardrail);
        }

        Ok(CurationDiagnostics {
            spec: assembled.interpretation.spec,
            interpretation_tier: assembled.interpretation.tier,
            centers: assembled.center_labels,
            forecast: assembled.forecast,
            candidates: assembled.scored,
            selection,
        })
    }

    /// Shared front half of the pipeline: interpretation, forecast, fan-out,
    /// curated supplementation, scoring
    async fn assemble(
        &self,
        vibe: &str,
        origin: GeoPoint,
        policy: &TravelPolicy,
    ) -> AppResult<Assembled> {
        let vibe = vibe.trim();
        let length = vibe.chars().count();
        if !(VIBE_MIN_CHARS..=VIBE_MAX_CHARS).contains(&length) {
            return Err(AppError::InvalidInput(format!(
                "Vibe text must be {}..{} characters, got {}",
                VIBE_MIN_CHARS, VIBE_MAX_CHARS, length
            )));
        }

        let interpretation = interpret_vibe(&self.llm, vibe, policy).await;

        let forecast = match self.forecast.forecast(origin).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(error = %e, "Forecast unavailable, scoring with neutral conditions");
                Forecast::neutral()
            }
        };

        let centers = plan_centers(origin, policy, &self.hubs);
        let center_labels: Vec<String> = centers.iter().map(|c| c.label.clone()).collect();

        let mut routed = fan_out(self.places.clone(), &interpretation.spec, origin, &centers).await;

        if let Some(store) = &self.store {
            match store
                .activities_for(ORIGIN_REGION, &interpretation.spec.buckets)
                .await
            {
                Ok(curated) => {
                    let known: HashSet<String> =
                        routed.iter().map(|r| r.candidate.id.clone()).collect();
                    for candidate in curated {
                        if known.contains(&candidate.id) {
                            continue;
                        }
                        let distance_km = origin.distance_km(&candidate.location);
                        routed.push(RoutedCandidate {
                            travel_minutes: travel_minutes(distance_km, LOCAL_SPEED_KMH),
                            distance_km,
                            candidate,
                        });
                    }
                }
                Err(e) => {
                    // same contract as a failed region: contribute nothing
                    tracing::warn!(error = %e, "Curated store lookup failed, skipping supplement");
                }
            }
        }

        let spec = &interpretation.spec;
        let scored: Vec<ScoredCandidate> = routed
            .into_iter()
            .map(|r| ScoredCandidate {
                relevance: relevance_score(&r.candidate, spec),
                feasibility: score_feasibility(&r.candidate),
                weather: score_weather(&r.candidate, &forecast),
                distance_km: r.distance_km,
                travel_minutes: r.travel_minutes,
                candidate: r.candidate,
            })
            .collect();

        tracing::debug!(
            scored = scored.len(),
            centers = center_labels.len(),
            "Pipeline assembly done"
        );

        Ok(Assembled {
            interpretation,
            forecast,
            center_labels,
            scored,
        })
    }
}
