use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::services::{export_service, ExportTracker};
use crate::utils::AppResult;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/exports/responses/advanced",
    tag = "Exports",
    responses(
        (status = 200, description = "Four-sheet styled workbook as base64 with a summary"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "No responses to export")
    ),
    security(("bearer_auth" = []))
)]
pub async fn responses_advanced(
    db: web::Data<MongoDB>,
    tracker: web::Data<ExportTracker>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    log::info!("📊 POST /exports/responses/advanced - requested by {}", claims.sub);
    let export = export_service::export_responses_advanced(&db, &tracker).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Advanced export completed successfully",
        "export": export
    })))
}

#[utoipa::path(
    post,
    path = "/api/exports/invitees/status",
    tag = "Exports",
    responses(
        (status = 200, description = "Roster with response status as base64 xlsx"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn invitees_status(
    db: web::Data<MongoDB>,
    tracker: web::Data<ExportTracker>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    log::info!("📊 POST /exports/invitees/status - requested by {}", claims.sub);
    let export = export_service::export_invitees_status(&db, &tracker).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Invitee status export completed successfully",
        "export": export
    })))
}

#[utoipa::path(
    post,
    path = "/api/exports/cab-allocations",
    tag = "Exports",
    responses(
        (status = 200, description = "One row per cab member as base64 xlsx"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cab_allocations(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    log::info!("📊 POST /exports/cab-allocations - requested by {}", claims.sub);
    let export = export_service::export_cab_allocations(&db).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Cab allocation export completed successfully",
        "export": export
    })))
}

#[utoipa::path(
    get,
    path = "/api/exports/progress/{export_id}",
    tag = "Exports",
    params(("export_id" = String, Path, description = "Id returned by an export")),
    responses((status = 200, description = "Progress, or status not_found")),
    security(("bearer_auth" = []))
)]
pub async fn progress(
    tracker: web::Data<ExportTracker>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    match tracker.get(&path) {
        Some(progress) => Ok(HttpResponse::Ok().json(progress)),
        None => Ok(HttpResponse::Ok().json(json!({ "status": "not_found" }))),
    }
}
