/// External collaborator abstractions
///
/// The curation pipeline consumes three outside services: a places-data
/// provider, a forecast provider, and a language-model service. Each is a
/// trait here so the pipeline can be exercised against stubs; the HTTP
/// adapters map loosely-typed wire payloads into strict internal types at
/// this boundary and nothing looser crosses into scoring or selection.
use crate::{
    error::AppResult,
    models::{Candidate, Forecast, GeoPoint},
};

pub mod forecast;
pub mod llm;
pub mod places;

/// One search-center query against the places provider
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
    /// Candidate-type tags, provider-side filter
    pub kinds: Vec<String>,
    /// Free-text keywords, provider-side filter
    pub keywords: Vec<String>,
    pub min_rating: f64,
    /// Region label stamped onto every returned candidate
    pub region: String,
}

/// Places-data provider: venues with rating, volume, coordinates, tags
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn search_places(&self, query: &PlacesQuery) -> AppResult<Vec<Candidate>>;

    /// Provider name for logging and diagnostics
    fn name(&self) -> &'static str;
}

/// Forecast provider: short-range conditions at a coordinate
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, location: GeoPoint) -> AppResult<Forecast>;

    fn name(&self) -> &'static str;
}

/// Language-model service: instruction + payload in, JSON object out.
/// Callers treat every response as untrusted and validate structurally.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete_json(&self, system: &str, user: &str) -> AppResult<serde_json::Value>;

    fn name(&self) -> &'static str;
}
