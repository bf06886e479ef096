use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    db::{geo_cell, Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ApiPlace, Candidate},
    services::providers::{PlacesProvider, PlacesQuery},
};

const PLACES_CACHE_TTL: u64 = 900; // 15 minutes

/// HTTP adapter for the places provider, with a semantic result cache in
/// front so concurrent region queries for the same area hit the network once
#[derive(Clone)]
pub struct HttpPlacesProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

#[derive(Debug, Deserialize)]
struct ApiPlacesResponse {
    #[serde(default)]
    results: Vec<ApiPlace>,
}

impl HttpPlacesProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    fn cache_key(query: &PlacesQuery) -> CacheKey {
        CacheKey::PlacesSearch {
            cell: geo_cell(&query.center),
            radius_km: query.radius_km.round() as u32,
            kinds: query.kinds.join(","),
        }
    }

    async fn call_api(&self, query: &PlacesQuery) -> AppResult<Vec<ApiPlace>> {
        let url = format!("{}/v1/search", self.api_url);
        let radius_m = (query.radius_km * 1000.0).round();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.clone()),
                ("lat", query.center.lat.to_string()),
                ("lon", query.center.lon.to_string()),
                ("radius", radius_m.to_string()),
                ("kinds", query.kinds.join(",")),
                ("keywords", query.keywords.join(" ")),
                ("min_rating", query.min_rating.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Places API returned status {}: {}",
                status, body
            )));
        }

        let parsed: ApiPlacesResponse = response.json().await?;
        Ok(parsed.results)
    }
}

#[async_trait::async_trait]
impl PlacesProvider for HttpPlacesProvider {
    async fn search_places(&self, query: &PlacesQuery) -> AppResult<Vec<Candidate>> {
        let key = Self::cache_key(query);

        let places: Vec<ApiPlace> = match self.cache.get(&key).await {
            Some(cached) => {
                tracing::debug!(key = %key, "Places cache hit");
                cached
            }
            None => {
                let fetched = self.call_api(query).await?;
                self.cache.put(&key, &fetched, PLACES_CACHE_TTL).await;
                fetched
            }
        };

        // map at the boundary; provider-side filters are advisory, so the
        // rating floor is re-checked here
        let candidates: Vec<Candidate> = places
            .into_iter()
            .map(|p| p.into_candidate(&query.region))
            .filter(|c| c.rating >= query.min_rating || c.rating_count == 0)
            .collect();

        tracing::info!(
            region = %query.region,
            results = candidates.len(),
            provider = self.name(),
            "Places search completed"
        );

        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "http_places"
    }
}

// ApiPlace -> Candidate mapping is unit-tested in models::candidate; the
// tests here cover the cache keying this adapter owns.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn query(lat: f64, lon: f64, radius_km: f64) -> PlacesQuery {
        PlacesQuery {
            center: GeoPoint::new(lat, lon),
            radius_km,
            kinds: vec!["park".to_string(), "museum".to_string()],
            keywords: vec![],
            min_rating: 3.5,
            region: "local".to_string(),
        }
    }

    #[test]
    fn test_cache_key_is_semantic() {
        // nearby centers with the same filters share a key
        let a = HttpPlacesProvider::cache_key(&query(50.0812, 14.4301, 15.0));
        let b = HttpPlacesProvider::cache_key(&query(50.0789, 14.4342, 15.2));
        assert_eq!(format!("{}", a), format!("{}", b));
    }

    #[test]
    fn test_cache_key_varies_by_radius() {
        let a = HttpPlacesProvider::cache_key(&query(50.08, 14.43, 15.0));
        let b = HttpPlacesProvider::cache_key(&query(50.08, 14.43, 40.0));
        assert_ne!(format!("{}", a), format!("{}", b));
    }

    #[test]
    fn test_api_response_tolerates_missing_results() {
        let parsed: ApiPlacesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
