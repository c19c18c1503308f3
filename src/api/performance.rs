use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::services::{performance_service, RequestMetrics};
use crate::utils::{cache::TtlCache, AppResult};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ClearCacheQuery {
    pub pattern: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/performance/metrics",
    tag = "Performance",
    responses(
        (status = 200, description = "Database, cache and per-endpoint timings"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn metrics(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    request_metrics: web::Data<RequestMetrics>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let metrics = performance_service::system_metrics(&db, &cache, &request_metrics).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "metrics": metrics })))
}

#[utoipa::path(
    get,
    path = "/api/performance/recommendations",
    tag = "Performance",
    responses(
        (status = 200, description = "Tuning recommendations and a 0-100 score"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn recommendations(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    request_metrics: web::Data<RequestMetrics>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let metrics = performance_service::system_metrics(&db, &cache, &request_metrics).await?;
    let report = performance_service::report(&metrics);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "recommendations": report })))
}

#[utoipa::path(
    post,
    path = "/api/performance/cache/clear",
    tag = "Performance",
    params(("pattern" = Option<String>, Query, description = "Substring of the keys to drop; all when absent")),
    responses(
        (status = 200, description = "Number of dropped entries"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_cache(
    cache: web::Data<TtlCache>,
    claims: web::ReqData<Claims>,
    query: web::Query<ClearCacheQuery>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let cleared = performance_service::clear_cache(&cache, query.pattern.as_deref());
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Cache cleared successfully",
        "cleared_entries": cleared,
        "pattern": query.pattern
    })))
}

#[utoipa::path(
    post,
    path = "/api/performance/indexes",
    tag = "Performance",
    responses(
        (status = 200, description = "Indexes that were created or confirmed"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rebuild_indexes(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let indexes = performance_service::rebuild_indexes(&db).await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Database indexes optimized",
        "indexes": indexes
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::User;
    use crate::services::auth_service;
    use actix_web::{test, App};
    use std::time::Duration;

    #[actix_web::test]
    async fn test_clear_cache_by_pattern() {
        let config = AppConfig::for_tests();
        let token = auth_service::issue_token(&config.jwt, &User::sample("admin")).unwrap();
        let cache = web::Data::new(TtlCache::new());
        cache.set("dashboard_stats", json!({}), Duration::from_secs(60));
        cache.set("invitees_all", json!([]), Duration::from_secs(60));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(cache.clone())
                .service(
                    web::scope("/api/performance")
                        .wrap(crate::middleware::AuthMiddleware)
                        .route("/cache/clear", web::post().to(clear_cache)),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/performance/cache/clear?pattern=dashboard")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["cleared_entries"], json!(1));
        assert_eq!(cache.len(), 1);
    }
}
