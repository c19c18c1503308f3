use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::ProfileUpdateRequest;
use crate::services::profile_service;
use crate::utils::AppResult;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/api/profile/{employee_id}",
    tag = "Profile",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Roster, account, RSVP and cab details"),
        (status = 404, description = "Employee not found")
    )
)]
pub async fn get(db: web::Data<MongoDB>, path: web::Path<String>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(profile_service::get(&db, &path).await?))
}

#[utoipa::path(
    put,
    path = "/api/profile/{employee_id}",
    tag = "Profile",
    params(("employee_id" = String, Path, description = "Employee code")),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated fields"),
        (status = 400, description = "No fields or invalid email"),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<ProfileUpdateRequest>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    claims.require_self_or_admin(&employee_id)?;
    let result = profile_service::update(&db, &employee_id, &request).await?;
    log::info!("👤 Profile {} updated: {}", employee_id, result.updated_fields.join(", "));
    Ok(HttpResponse::Ok().json(result))
}
