use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::services::{dashboard_service, validation_service};
use crate::utils::{cache::TtlCache, AppResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "RSVP counters, cached for two minutes"))
)]
pub async fn stats(db: web::Data<MongoDB>, cache: web::Data<TtlCache>) -> AppResult<HttpResponse> {
    let stats = dashboard_service::stats(&db, &cache).await?;
    log::debug!("📈 Dashboard stats served (cached: {}, {} ms)", stats.cached, stats.query_time_ms);
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    post,
    path = "/api/data/refresh-totals",
    tag = "Dashboard",
    responses((status = 200, description = "Recounted totals and number of corrected flags"))
)]
pub async fn refresh_totals(db: web::Data<MongoDB>, cache: web::Data<TtlCache>) -> AppResult<HttpResponse> {
    log::info!("🔄 POST /data/refresh-totals");
    let result = dashboard_service::refresh_totals(&db, &cache).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Totals refreshed successfully",
        "updated_stats": result.updated_stats,
        "fixes_applied": result.fixes_applied
    })))
}

#[utoipa::path(
    get,
    path = "/api/data/integrity-check",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Consistency report"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn integrity_check(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let report = validation_service::check_integrity(&db).await?;
    log::info!("🩺 Integrity check by {}: {}", claims.sub, report.overall_status);
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    post,
    path = "/api/data/fix-integrity",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Applied fixes"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn fix_integrity(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let report = validation_service::fix_integrity(&db).await?;
    dashboard_service::invalidate(&cache);
    log::info!("🛠️  Integrity fixes by {}: {} applied", claims.sub, report.fixes_applied.len());
    Ok(HttpResponse::Ok().json(report))
}
