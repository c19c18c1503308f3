use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{CabAllocation, UploadResult};
use crate::services::cab_service::{self, EnhancedCabUpload};
use crate::utils::{upload::UploadForm, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/cab-allocations/upload",
    tag = "Cab Allocations",
    request_body(content_type = "multipart/form-data", description = "`file`: .csv or .xlsx allocation sheet"),
    responses(
        (status = 200, description = "Allocations replaced", body = UploadResult),
        (status = 400, description = "Wrong file type or missing columns"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    log::info!("🚕 POST /cab-allocations/upload - {}", file.filename);
    Ok(HttpResponse::Ok().json(cab_service::upload(&db, file).await?))
}

#[utoipa::path(
    post,
    path = "/api/cab-allocations/upload-enhanced",
    tag = "Cab Allocations",
    request_body(content_type = "multipart/form-data", description = "`file`: .csv or .xlsx allocation sheet"),
    responses(
        (status = 200, description = "Allocations validated and imported"),
        (status = 400, description = "Validation report with errors, nothing imported"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_enhanced(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let mut form = UploadForm::from_multipart(payload).await?;
    let file = form.take_file()?;
    log::info!("🚕 POST /cab-allocations/upload-enhanced - {}", file.filename);

    match cab_service::upload_enhanced(&db, file).await? {
        EnhancedCabUpload::Rejected(report) => Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Validation failed",
            "validation_report": report
        }))),
        EnhancedCabUpload::Imported { report, cabs_created } => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Successfully created {} cab allocations", cabs_created),
            "cabs_created": cabs_created,
            "validation_report": report
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/cab-allocations",
    tag = "Cab Allocations",
    responses((status = 200, description = "Every cab", body = [CabAllocation]))
)]
pub async fn list(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(cab_service::all(&db).await?))
}

#[utoipa::path(
    get,
    path = "/api/cab-allocations/enhanced",
    tag = "Cab Allocations",
    responses((status = 200, description = "Cabs with member roster details and a summary"))
)]
pub async fn list_enhanced(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    let (allocations, summary) = cab_service::all_enhanced(&db).await?;
    Ok(HttpResponse::Ok().json(json!({
        "allocations": allocations,
        "summary": summary
    })))
}

#[utoipa::path(
    get,
    path = "/api/cab-allocations/{employee_id}",
    tag = "Cab Allocations",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses((status = 200, description = "The employee's cab or a message", body = CabAllocation))
)]
pub async fn for_employee(db: web::Data<MongoDB>, path: web::Path<String>) -> AppResult<HttpResponse> {
    match cab_service::for_employee(&db, &path).await? {
        Some(cab) => Ok(HttpResponse::Ok().json(cab)),
        None => Ok(HttpResponse::Ok().json(json!({ "message": "No cab allocation found" }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/cab-allocations/employee/{employee_id}/enhanced",
    tag = "Cab Allocations",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses((status = 200, description = "The employee's cab with member details, or null"))
)]
pub async fn employee_enhanced(db: web::Data<MongoDB>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let allocation = cab_service::employee_enhanced(&db, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "allocation": allocation })))
}
