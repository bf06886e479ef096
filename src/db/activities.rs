use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::filter_spec::Bucket;
use crate::models::{Candidate, GeoPoint, RegionHub};

/// Read-only access to the curated-activity catalog: pre-vetted venues and
/// activities keyed by region and bucket, plus the region hub table used to
/// seed secondary search centers.
#[derive(Clone)]
pub struct ActivityStore {
    pool: PgPool,
    hubs: Vec<RegionHub>,
}

#[derive(Debug, sqlx::FromRow)]
struct HubRow {
    label: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    name: String,
    tags: Vec<String>,
    lat: f64,
    lon: f64,
    rating: f64,
    rating_count: i32,
    price_tier: i16,
    region: String,
    is_food: bool,
}

impl ActivityRow {
    fn into_candidate(self) -> Candidate {
        Candidate {
            // prefix keeps curated ids from ever colliding with provider ids
            id: format!("curated:{}", self.id),
            name: self.name,
            tags: self.tags,
            location: GeoPoint::new(self.lat, self.lon),
            rating: self.rating.clamp(0.0, 5.0),
            rating_count: self.rating_count.max(0) as u32,
            price_tier: (self.price_tier.max(0) as u8).min(4),
            region: self.region,
            is_food: self.is_food,
        }
    }
}

impl ActivityStore {
    /// Creates the store and loads the region hub catalog once at startup
    pub async fn new(pool: PgPool) -> AppResult<Self> {
        let hubs = Self::load_region_hubs(&pool).await?;

        tracing::info!(hub_count = hubs.len(), "Loaded region hub catalog");

        Ok(Self { pool, hubs })
    }

    async fn load_region_hubs(pool: &PgPool) -> AppResult<Vec<RegionHub>> {
        let rows = sqlx::query_as::<_, HubRow>(
            "SELECT label, lat, lon FROM region_hubs WHERE active = true ORDER BY label",
        )
        .fetch_all(pool)
        .await?;

        // labels are unique in the table; guard against seed-script mistakes
        let mut seen: HashMap<String, ()> = HashMap::new();
        let mut hubs = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.insert(row.label.clone(), ()).is_none() {
                hubs.push(RegionHub {
                    label: row.label,
                    location: GeoPoint::new(row.lat, row.lon),
                });
            }
        }

        Ok(hubs)
    }

    /// Region hubs usable as secondary search centers
    pub fn region_hubs(&self) -> &[RegionHub] {
        &self.hubs
    }

    /// Pre-vetted activities for a region and target buckets, mapped into
    /// candidates so they merge into the pool like any provider result
    pub async fn activities_for(
        &self,
        region: &str,
        buckets: &[Bucket],
    ) -> AppResult<Vec<Candidate>> {
        let bucket_names: Vec<String> = buckets
            .iter()
            .map(|b| {
                serde_json::to_value(b)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default()
            })
            .collect();

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, name, tags, lat, lon, rating, rating_count, price_tier, region, is_food
            FROM curated_activities
            WHERE region = $1 AND bucket = ANY($2)
            "#,
        )
        .bind(region)
        .bind(&bucket_names)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            region = %region,
            count = rows.len(),
            "Curated activity lookup"
        );

        Ok(rows.into_iter().map(ActivityRow::into_candidate).collect())
    }
}
