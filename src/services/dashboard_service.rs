use crate::{
    database::{MongoDB, INVITEES, RESPONSES},
    services::validation_service,
    utils::{cache::TtlCache, AppResult},
};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const DASHBOARD_CACHE_KEY: &str = "dashboard_stats";
pub const DASHBOARD_CACHE_PREFIX: &str = "dashboard";
pub const DASHBOARD_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_invitees: u64,
    pub total_responses: u64,
    pub rsvp_yes: u64,
    pub rsvp_no: u64,
    pub accommodation_requests: u64,
    pub food_preferences: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedStats {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub cached: bool,
    pub query_time_ms: u128,
}

pub async fn compute_stats(db: &MongoDB) -> AppResult<DashboardStats> {
    let invitees = db.collection::<Document>(INVITEES);
    let responses = db.collection::<Document>(RESPONSES);

    let total_invitees = invitees.count_documents(doc! {}).await?;
    let rsvp_yes = invitees.count_documents(doc! { "hasResponded": true }).await?;
    let total_responses = responses.count_documents(doc! {}).await?;
    let accommodation_requests = responses
        .count_documents(doc! { "requiresAccommodation": true })
        .await?;

    Ok(DashboardStats {
        total_invitees,
        total_responses,
        rsvp_yes,
        rsvp_no: total_invitees.saturating_sub(rsvp_yes),
        accommodation_requests,
        food_preferences: validation_service::food_preference_counts(db).await?,
    })
}

/// Dashboard counters, served from the cache for up to two minutes
pub async fn stats(db: &MongoDB, cache: &TtlCache) -> AppResult<CachedStats> {
    let started = Instant::now();

    if let Some(stats) = cache
        .get(DASHBOARD_CACHE_KEY)
        .and_then(|value| serde_json::from_value::<DashboardStats>(value).ok())
    {
        return Ok(CachedStats {
            stats,
            cached: true,
            query_time_ms: started.elapsed().as_millis(),
        });
    }

    let stats = compute_stats(db).await?;
    if let Ok(value) = serde_json::to_value(&stats) {
        cache.set(DASHBOARD_CACHE_KEY, value, DASHBOARD_TTL);
    }

    let elapsed = started.elapsed().as_millis();
    log::info!("📊 Dashboard stats computed in {} ms", elapsed);
    Ok(CachedStats {
        stats,
        cached: false,
        query_time_ms: elapsed,
    })
}

pub fn invalidate(cache: &TtlCache) {
    let removed = cache.clear(Some(DASHBOARD_CACHE_PREFIX));
    if removed > 0 {
        log::debug!("🧹 Dropped {} dashboard cache entries", removed);
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResult {
    pub updated_stats: DashboardStats,
    pub fixes_applied: u64,
}

/// Clears cached counters, re-syncs invitee flags and recounts
pub async fn refresh_totals(db: &MongoDB, cache: &TtlCache) -> AppResult<RefreshResult> {
    invalidate(cache);
    let fixes_applied = validation_service::sync_response_flags(db).await?;
    let updated_stats = compute_stats(db).await?;
    log::info!("🔄 Totals refreshed, {} invitee flags corrected", fixes_applied);
    Ok(RefreshResult {
        updated_stats,
        fixes_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_survive_the_cache() {
        let stats = DashboardStats {
            total_invitees: 10,
            total_responses: 4,
            rsvp_yes: 4,
            rsvp_no: 6,
            accommodation_requests: 2,
            food_preferences: BTreeMap::from([("Veg".to_string(), 3), ("Non-Veg".to_string(), 1)]),
        };
        let cache = TtlCache::new();
        cache.set(DASHBOARD_CACHE_KEY, serde_json::to_value(&stats).unwrap(), DASHBOARD_TTL);

        let value = cache.get(DASHBOARD_CACHE_KEY).unwrap();
        assert_eq!(value["rsvpYes"], 4);
        assert_eq!(serde_json::from_value::<DashboardStats>(value).unwrap(), stats);

        invalidate(&cache);
        assert_eq!(cache.len(), 0);
    }
}
