use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::models::travel::{
    travel_minutes, INTER_REGION_SPEED_KMH, LOCAL_SPEED_KMH, MAX_TRAVEL_MINUTES,
};
use crate::models::{Candidate, FilterSpec, GeoPoint, RegionHub, TravelPolicy};
use crate::services::providers::{PlacesProvider, PlacesQuery};

/// Per-region query timeout; a slow region contributes nothing rather than
/// stalling the request
pub const REGION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum request duration before secondary regions are considered
pub const DAY_TRIP_MIN_HOURS: f32 = 8.0;

/// Assumed on-site time that must fit in the budget alongside the round trip
pub const DWELL_MINUTES: u32 = 120;

/// Search radius used around secondary hubs
pub const HUB_RADIUS_KM: f64 = 35.0;

/// Region label of the origin search center
pub const ORIGIN_REGION: &str = "local";

/// Whether the policy supports searching beyond the local area at all
pub fn allows_day_trip(policy: &TravelPolicy) -> bool {
    policy.allow_excursions && policy.duration_hours >= DAY_TRIP_MIN_HOURS
}

/// One geographic center the fan-out will query
#[derive(Debug, Clone)]
pub struct SearchCenter {
    pub label: String,
    pub location: GeoPoint,
    /// Estimated one-way minutes from the request origin; 0 for the origin
    pub travel_minutes_from_origin: u32,
}

/// A candidate carrying the travel estimate of the center that produced it,
/// not of whichever center happens to be nearest
#[derive(Debug, Clone)]
pub struct RoutedCandidate {
    pub candidate: Candidate,
    pub distance_km: f64,
    pub travel_minutes: u32,
}

/// Picks the search centers for one request. The origin is always included;
/// regional hubs join only when travel is permitted, the duration marks a
/// day trip, and the round trip plus dwell time fits the budget. Enforcing
/// this here keeps provider-query budget off regions that cannot qualify.
pub fn plan_centers(
    origin: GeoPoint,
    policy: &TravelPolicy,
    hubs: &[RegionHub],
) -> Vec<SearchCenter> {
    let mut centers = vec![SearchCenter {
        label: ORIGIN_REGION.to_string(),
        location: origin,
        travel_minutes_from_origin: 0,
    }];

    if !allows_day_trip(policy) {
        return centers;
    }

    let budget_minutes = (policy.duration_hours * 60.0) as u32;
    for hub in hubs {
        let one_way = travel_minutes(origin.distance_km(&hub.location), INTER_REGION_SPEED_KMH);
        let feasible = one_way <= policy.max_travel_minutes
            && one_way <= MAX_TRAVEL_MINUTES
            && 2 * one_way + DWELL_MINUTES <= budget_minutes;
        if feasible {
            centers.push(SearchCenter {
                label: hub.label.clone(),
                location: hub.location,
                travel_minutes_from_origin: one_way,
            });
        } else {
            tracing::debug!(hub = %hub.label, one_way, "Hub outside travel budget, skipped");
        }
    }

    tracing::info!(centers = centers.len(), "Search centers planned");
    centers
}

/// Queries every center concurrently and merges the results. A center whose
/// query fails or times out contributes zero candidates; duplicates across
/// centers keep the copy with the lower travel time.
pub async fn fan_out(
    provider: Arc<dyn PlacesProvider>,
    spec: &FilterSpec,
    origin: GeoPoint,
    centers: &[SearchCenter],
) -> Vec<RoutedCandidate> {
    let mut tasks = Vec::new();

    for center in centers {
        let provider = provider.clone();
        let center = center.clone();
        let query = PlacesQuery {
            center: center.location,
            radius_km: if center.travel_minutes_from_origin == 0 {
                spec.radius_km
            } else {
                spec.radius_km.min(HUB_RADIUS_KM)
            },
            kinds: spec.kinds.clone(),
            keywords: spec.keywords.clone(),
            min_rating: spec.min_rating,
            region: center.label.clone(),
        };

        let task = tokio::spawn(async move {
            let result = timeout(REGION_QUERY_TIMEOUT, provider.search_places(&query)).await;
            (center, result)
        });
        tasks.push(task);
    }

    let mut merged: HashMap<String, RoutedCandidate> = HashMap::new();
    let mut failed_centers = 0usize;

    for task in tasks {
        let (center, result) = match task.await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "Region query task panicked");
                failed_centers += 1;
                continue;
            }
        };

        let candidates = match result {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                tracing::warn!(region = %center.label, error = %e, "Region query failed");
                failed_centers += 1;
                continue;
            }
            Err(_) => {
                tracing::warn!(region = %center.label, "Region query timed out");
                failed_centers += 1;
                continue;
            }
        };

        for mut candidate in candidates {
            // the center label is authoritative, whatever the adapter stamped
            candidate.region = center.label.clone();
            let local_leg =
                travel_minutes(center.location.distance_km(&candidate.location), LOCAL_SPEED_KMH);
            let routed = RoutedCandidate {
                distance_km: origin.distance_km(&candidate.location),
                travel_minutes: center.travel_minutes_from_origin + local_leg,
                candidate,
            };

            match merged.get(&routed.candidate.id) {
                Some(existing) if existing.travel_minutes <= routed.travel_minutes => {}
                _ => {
                    merged.insert(routed.candidate.id.clone(), routed);
                }
            }
        }
    }

    if failed_centers > 0 {
        tracing::warn!(
            failed_centers,
            total_centers = centers.len(),
            "Partial fan-out failure"
        );
    }

    let mut pool: Vec<RoutedCandidate> = merged.into_values().collect();
    // results are re-sorted so selection never depends on completion order
    pool.sort_by(|a, b| a.candidate.id.cmp(&b.candidate.id));

    tracing::info!(candidates = pool.len(), "Fan-out merged");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::providers::MockPlacesProvider;

    fn origin() -> GeoPoint {
        GeoPoint::new(50.0755, 14.4378)
    }

    fn hub(label: &str, lat: f64, lon: f64) -> RegionHub {
        RegionHub {
            label: label.to_string(),
            location: GeoPoint::new(lat, lon),
        }
    }

    fn candidate(id: &str, lat: f64, lon: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: format!("Place {}", id),
            tags: vec!["park".to_string()],
            location: GeoPoint::new(lat, lon),
            rating: 4.2,
            rating_count: 300,
            price_tier: 1,
            region: String::new(),
            is_food: false,
        }
    }

    fn day_trip_policy() -> TravelPolicy {
        TravelPolicy {
            max_travel_minutes: 400,
            allow_excursions: true,
            duration_hours: 10.0,
        }
    }

    #[test]
    fn test_plan_centers_local_only_when_travel_disabled() {
        let policy = TravelPolicy {
            max_travel_minutes: 60,
            allow_excursions: false,
            duration_hours: 10.0,
        };
        let centers = plan_centers(origin(), &policy, &[hub("Brno", 49.195, 16.607)]);
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].label, ORIGIN_REGION);
    }

    #[test]
    fn test_plan_centers_local_only_for_short_duration() {
        let policy = TravelPolicy {
            max_travel_minutes: 400,
            allow_excursions: true,
            duration_hours: 4.0,
        };
        let centers = plan_centers(origin(), &policy, &[hub("Brno", 49.195, 16.607)]);
        assert_eq!(centers.len(), 1);
    }

    #[test]
    fn test_plan_centers_includes_reachable_hub() {
        // Brno is ~185 km away: ~158 one-way minutes at 70 km/h, round trip
        // plus dwell fits comfortably into 10 hours
        let centers = plan_centers(origin(), &day_trip_policy(), &[hub("Brno", 49.195, 16.607)]);
        assert_eq!(centers.len(), 2);
        assert_eq!(centers[1].label, "Brno");
        assert!(centers[1].travel_minutes_from_origin > 120);
    }

    #[test]
    fn test_plan_centers_excludes_hub_beyond_budget() {
        // ~1030 km away; no 10-hour day accommodates the round trip
        let centers = plan_centers(origin(), &day_trip_policy(), &[hub("Marseille", 43.3, 5.37)]);
        assert_eq!(centers.len(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_tolerates_failed_center() {
        let mut provider = MockPlacesProvider::new();
        provider.expect_search_places().returning(|query| {
            if query.region == ORIGIN_REGION {
                Ok(vec![candidate("a", 50.08, 14.44), candidate("b", 50.09, 14.40)])
            } else {
                Err(AppError::ExternalApi("region down".to_string()))
            }
        });
        provider.expect_name().return_const("mock");

        let centers = vec![
            SearchCenter {
                label: ORIGIN_REGION.to_string(),
                location: origin(),
                travel_minutes_from_origin: 0,
            },
            SearchCenter {
                label: "Brno".to_string(),
                location: GeoPoint::new(49.195, 16.607),
                travel_minutes_from_origin: 158,
            },
        ];

        let pool = fan_out(
            Arc::new(provider),
            &FilterSpec::default(),
            origin(),
            &centers,
        )
        .await;

        assert_eq!(pool.len(), 2);
    }

    #[tokio::test]
    async fn test_fan_out_dedup_keeps_lower_travel_time() {
        // the same venue comes back from both centers; the origin copy has
        // no inter-region leg and must win
        let mut provider = MockPlacesProvider::new();
        provider
            .expect_search_places()
            .returning(|_| Ok(vec![candidate("shared", 50.08, 14.44)]));
        provider.expect_name().return_const("mock");

        let centers = vec![
            SearchCenter {
                label: ORIGIN_REGION.to_string(),
                location: origin(),
                travel_minutes_from_origin: 0,
            },
            SearchCenter {
                label: "Brno".to_string(),
                location: GeoPoint::new(49.195, 16.607),
                travel_minutes_from_origin: 158,
            },
        ];

        let pool = fan_out(
            Arc::new(provider),
            &FilterSpec::default(),
            origin(),
            &centers,
        )
        .await;

        assert_eq!(pool.len(), 1);
        assert!(pool[0].travel_minutes < 60);
    }

    #[tokio::test]
    async fn test_fan_out_travel_uses_originating_center() {
        // a venue near Brno found via the Brno center carries the full
        // origin->Brno leg even though the crow-flies distance is shorter
        let mut provider = MockPlacesProvider::new();
        provider.expect_search_places().returning(|query| {
            if query.region == "Brno" {
                Ok(vec![candidate("remote", 49.20, 16.60)])
            } else {
                Ok(vec![])
            }
        });
        provider.expect_name().return_const("mock");

        let centers = vec![
            SearchCenter {
                label: ORIGIN_REGION.to_string(),
                location: origin(),
                travel_minutes_from_origin: 0,
            },
            SearchCenter {
                label: "Brno".to_string(),
                location: GeoPoint::new(49.195, 16.607),
                travel_minutes_from_origin: 158,
            },
        ];

        let pool = fan_out(
            Arc::new(provider),
            &FilterSpec::default(),
            origin(),
            &centers,
        )
        .await;

        assert_eq!(pool.len(), 1);
        assert!(pool[0].travel_minutes >= 158);
        assert_eq!(pool[0].candidate.region, "Brno");
    }
}
