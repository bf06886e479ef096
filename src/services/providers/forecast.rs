use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    db::{geo_cell, Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Forecast, GeoPoint},
    services::providers::ForecastProvider,
};

const FORECAST_CACHE_TTL: u64 = 1800; // 30 minutes

/// HTTP adapter for the forecast provider
#[derive(Clone)]
pub struct HttpForecastProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

/// Raw forecast payload; mapped into `Forecast` at the boundary
#[derive(Debug, Deserialize)]
struct ApiForecast {
    #[serde(default)]
    temperature_c: Option<f64>,
    #[serde(default)]
    precipitation_mm: Option<f64>,
    #[serde(default)]
    wind_speed_ms: Option<f64>,
}

impl ApiForecast {
    fn into_forecast(self) -> Forecast {
        let neutral = Forecast::neutral();
        Forecast {
            temperature_c: self.temperature_c.unwrap_or(neutral.temperature_c),
            precipitation_mm: self.precipitation_mm.unwrap_or(0.0).max(0.0),
            wind_speed_ms: self.wind_speed_ms.unwrap_or(0.0).max(0.0),
            estimated: false,
            retrieved_at: Utc::now(),
        }
    }
}

impl HttpForecastProvider {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }
}

#[async_trait::async_trait]
impl ForecastProvider for HttpForecastProvider {
    async fn forecast(&self, location: GeoPoint) -> AppResult<Forecast> {
        let key = CacheKey::Forecast {
            cell: geo_cell(&location),
        };

        if let Some(cached) = self.cache.get::<Forecast>(&key).await {
            tracing::debug!(key = %key, "Forecast cache hit");
            return Ok(cached);
        }

        let url = format!("{}/v1/forecast", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Forecast API returned status {}: {}",
                status, body
            )));
        }

        let raw: ApiForecast = response.json().await?;
        let forecast = raw.into_forecast();

        self.cache.put(&key, &forecast, FORECAST_CACHE_TTL).await;

        tracing::info!(
            temperature_c = forecast.temperature_c,
            precipitation_mm = forecast.precipitation_mm,
            provider = self.name(),
            "Forecast fetched"
        );

        Ok(forecast)
    }

    fn name(&self) -> &'static str {
        "http_forecast"
    }
}
