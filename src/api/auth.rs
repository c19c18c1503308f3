use crate::api::client_info;
use crate::config::AppConfig;
use crate::middleware::Claims;
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, OfficeTypeRequest, UserInfo};
use crate::services::auth_service;
use crate::{database::MongoDB, utils::AppError, utils::AppResult};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/auth/status",
    tag = "Auth",
    responses((status = 200, description = "Login status for unauthenticated callers"))
)]
pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "authenticated": false,
        "message": "Authentication service is running. Please log in."
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid employee code or password"),
        (status = 403, description = "Account is disabled")
    )
)]
pub async fn login(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    log::info!("🔐 POST /auth/login - employee: {}", request.employee_id);
    let (ip_address, user_agent) = client_info(&req);

    match auth_service::login(&db, &config.jwt, &request, ip_address, user_agent).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.employee_id);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.employee_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    let user = auth_service::find_user(&db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(UserInfo::from(&user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Wrong current password or new password too short")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    log::info!("🔑 POST /auth/change-password - employee: {}", claims.sub);
    auth_service::change_password(&db, &claims.sub, &request).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/office-type",
    tag = "Auth",
    request_body = OfficeTypeRequest,
    responses(
        (status = 200, description = "Office type saved"),
        (status = 400, description = "Invalid office type"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_office_type(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<OfficeTypeRequest>,
) -> AppResult<HttpResponse> {
    if !auth_service::set_office_type(&db, &claims.sub, &request.office_type).await? {
        return Err(AppError::not_found("User not found"));
    }
    log::info!("🏢 {} set office type to {}", claims.sub, request.office_type);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Office type updated successfully",
        "officeType": request.office_type
    })))
}

#[utoipa::path(
    get,
    path = "/api/auth/permissions",
    tag = "Auth",
    responses((status = 200, description = "Permissions of the caller")),
    security(("bearer_auth" = []))
)]
pub async fn permissions(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    let permissions = auth_service::get_permissions(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "employeeId": claims.sub,
        "role": claims.role,
        "permissions": permissions
    })))
}
