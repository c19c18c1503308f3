use crate::models::{Invitee, InviteeFilter, UnrespondedInvitee, UploadResult};
use crate::services::invitee_service::{self, EnhancedUpload};
use crate::services::dashboard_service;
use crate::utils::{cache::TtlCache, upload::UploadForm, AppResult};
use crate::database::MongoDB;
use crate::middleware::Claims;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/invitees/bulk-upload",
    tag = "Invitees",
    request_body(content_type = "multipart/form-data", description = "`file`: .csv or .xlsx roster"),
    responses(
        (status = 200, description = "Roster replaced", body = UploadResult),
        (status = 400, description = "Wrong file type, missing columns or repeated Employee ID"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_upload(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    log::info!("📥 POST /invitees/bulk-upload - {}", file.filename);

    let result = invitee_service::bulk_upload(&db, file).await?;
    dashboard_service::invalidate(&cache);
    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    post,
    path = "/api/invitees/bulk-upload-enhanced",
    tag = "Invitees",
    request_body(content_type = "multipart/form-data", description = "`file`: .csv or .xlsx roster"),
    responses(
        (status = 200, description = "Roster validated and imported"),
        (status = 400, description = "Validation report with errors, nothing imported"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_upload_enhanced(
    db: web::Data<MongoDB>,
    cache: web::Data<TtlCache>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    log::info!("📥 POST /invitees/bulk-upload-enhanced - {}", file.filename);

    match invitee_service::bulk_upload_enhanced(&db, file).await? {
        EnhancedUpload::Rejected(report) => Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Validation failed",
            "validation_report": report
        }))),
        EnhancedUpload::Imported { report, inserted } => {
            dashboard_service::invalidate(&cache);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": format!("Successfully uploaded {} invitees", inserted),
                "inserted_count": inserted,
                "validation_report": report
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/invitees",
    tag = "Invitees",
    responses((status = 200, description = "Full roster", body = [Invitee]))
)]
pub async fn list(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(invitee_service::list_all(&db).await?))
}

#[utoipa::path(
    get,
    path = "/api/invitees/unresponded",
    tag = "Invitees",
    responses((status = 200, description = "Invitees without an RSVP", body = [UnrespondedInvitee]))
)]
pub async fn unresponded(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(invitee_service::list_unresponded(&db).await?))
}

#[utoipa::path(
    get,
    path = "/api/invitees/paginated",
    tag = "Invitees",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("cadre" = Option<String>, Query, description = "Exact cadre"),
        ("projectName" = Option<String>, Query, description = "Exact project name"),
        ("hasResponded" = Option<bool>, Query, description = "RSVP state")
    ),
    responses((status = 200, description = "One page of invitees"))
)]
pub async fn paginated(db: web::Data<MongoDB>, query: web::Query<InviteeFilter>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(invitee_service::list_paginated(&db, &query).await?))
}
