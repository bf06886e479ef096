use std::fmt::Display;

use redis::{AsyncCommands, Client};

use crate::error::AppResult;
use crate::models::GeoPoint;

/// Rounds a coordinate to a ~1 km cell so nearby origins share cache entries
pub fn geo_cell(point: &GeoPoint) -> String {
    format!("{:.2},{:.2}", point.lat, point.lon)
}

/// Cache keys are semantic: two requests asking the provider the same
/// question hit the same entry regardless of which user asked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Places search for one center: coordinate cell, radius, kind filter
    PlacesSearch {
        cell: String,
        radius_km: u32,
        kinds: String,
    },
    /// Forecast for one coordinate cell
    Forecast { cell: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::PlacesSearch {
                cell,
                radius_km,
                kinds,
            } => write!(f, "places:{}:{}:{}", cell, radius_km, kinds.to_lowercase()),
            CacheKey::Forecast { cell } => write!(f, "forecast:{}", cell),
        }
    }
}

/// Creates a Redis client for the provider result cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Short-lived result cache in front of the external providers. Every
/// operation is failure-tolerant: a broken cache degrades to a provider
/// call, it never fails a request.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
}

impl Cache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Retrieves a cached value; `None` on miss. Connection or decode
    /// problems are logged and reported as a miss.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn try_get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Cache entry undecodable, ignoring");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Stores a value with a TTL. Failures are logged and swallowed.
    pub async fn put<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let result: AppResult<()> = async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(format!("{}", key), json, ttl_secs).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, key = %key, "Cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_places_key_display() {
        let key = CacheKey::PlacesSearch {
            cell: "50.08,14.43".to_string(),
            radius_km: 15,
            kinds: "Park,Museum".to_string(),
        };
        assert_eq!(format!("{}", key), "places:50.08,14.43:15:park,museum");
    }

    #[test]
    fn test_forecast_key_display() {
        let key = CacheKey::Forecast {
            cell: "49.20,16.61".to_string(),
        };
        assert_eq!(format!("{}", key), "forecast:49.20,16.61");
    }

    #[test]
    fn test_geo_cell_rounds_nearby_points_together() {
        let a = GeoPoint::new(50.0812, 14.4301);
        let b = GeoPoint::new(50.0789, 14.4342);
        assert_eq!(geo_cell(&a), geo_cell(&b));
    }
}
