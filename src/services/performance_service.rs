use crate::{
    database::MongoDB,
    utils::{cache::TtlCache, AppResult},
};
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

const LOW_CACHE_HIT_RATE: f64 = 70.0;
const LARGE_DATABASE_MB: f64 = 1000.0;
const SLOW_ENDPOINT_SECS: f64 = 1.0;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EndpointStats {
    pub count: u64,
    pub total_time: f64,
    pub avg_time: f64,
    pub errors: u64,
}

/// Per-endpoint timings plus process-wide request/error totals
#[derive(Debug, Default)]
pub struct RequestMetrics {
    endpoints: RwLock<HashMap<String, EndpointStats>>,
    requests_total: AtomicU64,
    errors_total: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: &str, elapsed: Duration, status: u16) {
        let is_error = status >= 400;
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut endpoints) = self.endpoints.write() {
            let stats = endpoints.entry(endpoint.to_string()).or_default();
            stats.count += 1;
            stats.total_time += elapsed.as_secs_f64();
            stats.avg_time = stats.total_time / stats.count as f64;
            if is_error {
                stats.errors += 1;
            }
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BTreeMap<String, EndpointStats> {
        self.endpoints
            .read()
            .map(|endpoints| endpoints.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DatabaseStats {
    pub collections: i64,
    pub data_size_mb: f64,
    pub storage_size_mb: f64,
    pub indexes: i64,
}

fn number(stats: &Document, key: &str) -> f64 {
    match stats.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

fn megabytes(bytes: f64) -> f64 {
    (bytes / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

impl DatabaseStats {
    /// Reads the fields we report from a `dbStats` reply
    pub fn from_db_stats(stats: &Document) -> Self {
        Self {
            collections: number(stats, "collections") as i64,
            data_size_mb: megabytes(number(stats, "dataSize")),
            storage_size_mb: megabytes(number(stats, "storageSize")),
            indexes: number(stats, "indexes") as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApplicationStats {
    pub cache_hit_rate_percent: f64,
    pub cache_entries: usize,
    pub api_endpoints_monitored: usize,
    pub requests_total: u64,
    pub errors_total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseStats,
    pub application: ApplicationStats,
    pub api_performance: BTreeMap<String, EndpointStats>,
}

pub fn application_stats(cache: &TtlCache, metrics: &RequestMetrics, endpoints: usize) -> ApplicationStats {
    ApplicationStats {
        cache_hit_rate_percent: (cache.hit_rate_percent() * 100.0).round() / 100.0,
        cache_entries: cache.len(),
        api_endpoints_monitored: endpoints,
        requests_total: metrics.requests_total(),
        errors_total: metrics.errors_total(),
    }
}

pub async fn database_stats(db: &MongoDB) -> AppResult<DatabaseStats> {
    let stats = db.database().run_command(doc! { "dbStats": 1 }).await?;
    Ok(DatabaseStats::from_db_stats(&stats))
}

pub async fn system_metrics(db: &MongoDB, cache: &TtlCache, metrics: &RequestMetrics) -> AppResult<SystemMetrics> {
    let database = database_stats(db).await?;
    let api_performance = metrics.snapshot();
    Ok(SystemMetrics {
        timestamp: Utc::now(),
        database,
        application: application_stats(cache, metrics, api_performance.len()),
        api_performance,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub priority: &'static str,
    pub message: String,
    pub actions: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationReport {
    pub timestamp: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
    pub performance_score: u8,
    pub metrics_summary: BTreeMap<&'static str, &'static str>,
}

pub fn slow_endpoints(api_performance: &BTreeMap<String, EndpointStats>) -> Vec<String> {
    api_performance
        .iter()
        .filter(|(_, stats)| stats.avg_time > SLOW_ENDPOINT_SECS)
        .map(|(endpoint, _)| endpoint.clone())
        .collect()
}

pub fn recommendations(metrics: &SystemMetrics) -> Vec<Recommendation> {
    let mut found = Vec::new();

    if metrics.database.data_size_mb > LARGE_DATABASE_MB {
        found.push(Recommendation {
            kind: "large_database",
            priority: "medium",
            message: "Database size is growing. Consider implementing data archiving.".to_string(),
            actions: vec!["Archive old responses", "Implement data retention policy", "Add data compression"],
        });
    }

    if metrics.application.cache_hit_rate_percent < LOW_CACHE_HIT_RATE {
        found.push(Recommendation {
            kind: "low_cache_hit_rate",
            priority: "medium",
            message: "Cache hit rate is low. Consider adjusting cache TTL and strategy.".to_string(),
            actions: vec!["Increase cache TTL", "Cache more static data", "Implement smarter cache keys"],
        });
    }

    let slow = slow_endpoints(&metrics.api_performance);
    if !slow.is_empty() {
        found.push(Recommendation {
            kind: "slow_endpoints",
            priority: "high",
            message: format!("Slow endpoints detected: {}", slow.join(", ")),
            actions: vec!["Add response caching", "Optimize database queries", "Implement pagination"],
        });
    }

    found
}

/// 0-100: cache hit rate above 80% earns a bonus, below costs points, and
/// every slow endpoint costs 5.
pub fn performance_score(metrics: &SystemMetrics) -> u8 {
    let hit_rate = metrics.application.cache_hit_rate_percent;
    let mut score = 100.0;
    if hit_rate > 80.0 {
        score += (hit_rate - 80.0) * 0.2;
    } else {
        score -= (80.0 - hit_rate) * 0.3;
    }
    score -= slow_endpoints(&metrics.api_performance).len() as f64 * 5.0;
    score.clamp(0.0, 100.0) as u8
}

pub fn report(metrics: &SystemMetrics) -> RecommendationReport {
    let cache_health = if metrics.application.cache_hit_rate_percent > 80.0 {
        "good"
    } else {
        "warning"
    };
    let api_health = if slow_endpoints(&metrics.api_performance).is_empty() {
        "good"
    } else {
        "warning"
    };

    RecommendationReport {
        timestamp: Utc::now(),
        recommendations: recommendations(metrics),
        performance_score: performance_score(metrics),
        metrics_summary: BTreeMap::from([("cache_health", cache_health), ("api_health", api_health)]),
    }
}

pub fn clear_cache(cache: &TtlCache, pattern: Option<&str>) -> usize {
    let pattern = pattern.map(str::trim).filter(|p| !p.is_empty());
    let removed = cache.clear(pattern);
    log::info!("🧹 Cleared {} cache entries (pattern: {})", removed, pattern.unwrap_or("*"));
    removed
}

pub async fn rebuild_indexes(db: &MongoDB) -> Vec<String> {
    db.ensure_indexes().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics_with(hit_rate: f64, data_size_mb: f64, api: BTreeMap<String, EndpointStats>) -> SystemMetrics {
        SystemMetrics {
            timestamp: Utc::now(),
            database: DatabaseStats {
                data_size_mb,
                ..Default::default()
            },
            application: ApplicationStats {
                cache_hit_rate_percent: hit_rate,
                cache_entries: 0,
                api_endpoints_monitored: api.len(),
                requests_total: 0,
                errors_total: 0,
            },
            api_performance: api,
        }
    }

    #[test]
    fn test_record_request_metrics() {
        let metrics = RequestMetrics::new();
        metrics.record("GET /api/dashboard/stats", Duration::from_millis(100), 200);
        metrics.record("GET /api/dashboard/stats", Duration::from_millis(300), 500);
        metrics.record("POST /api/auth/login", Duration::from_millis(50), 401);

        let snapshot = metrics.snapshot();
        let stats = &snapshot["GET /api/dashboard/stats"];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.errors, 1);
        assert!((stats.avg_time - 0.2).abs() < 1e-9);
        assert_eq!(metrics.requests_total(), 3);
        assert_eq!(metrics.errors_total(), 2);
    }

    #[test]
    fn test_database_stats_from_reply() {
        let reply = doc! { "collections": 12, "dataSize": 5_242_880.0, "storageSize": 10_485_760_i64, "indexes": 31 };
        let stats = DatabaseStats::from_db_stats(&reply);
        assert_eq!(stats.collections, 12);
        assert_eq!(stats.data_size_mb, 5.0);
        assert_eq!(stats.storage_size_mb, 10.0);
        assert_eq!(stats.indexes, 31);
    }

    #[test]
    fn test_recommendations_and_score() {
        let healthy = metrics_with(90.0, 10.0, BTreeMap::new());
        assert!(recommendations(&healthy).is_empty());
        assert_eq!(performance_score(&healthy), 100);

        let slow = BTreeMap::from([(
            "GET /api/exports".to_string(),
            EndpointStats {
                count: 2,
                total_time: 3.0,
                avg_time: 1.5,
                errors: 0,
            },
        )]);
        let struggling = metrics_with(40.0, 2048.0, slow);
        let found = recommendations(&struggling);
        let kinds: Vec<&str> = found.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec!["large_database", "low_cache_hit_rate", "slow_endpoints"]);
        assert_eq!(found[2].message, "Slow endpoints detected: GET /api/exports");
        assert_eq!(performance_score(&struggling), 83);

        let json = serde_json::to_value(&found[0]).unwrap();
        assert_eq!(json["type"], json!("large_database"));
    }

    #[test]
    fn test_clear_cache_pattern() {
        let cache = TtlCache::new();
        cache.set("dashboard_stats", json!(1), Duration::from_secs(60));
        cache.set("invitees_page_1", json!(2), Duration::from_secs(60));
        assert_eq!(clear_cache(&cache, Some("dashboard")), 1);
        assert_eq!(clear_cache(&cache, Some("  ")), 1);
        assert_eq!(cache.len(), 0);
    }
}
