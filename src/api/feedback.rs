use crate::api::client_info;
use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{
    AdminFeedbackQuery, FeedbackView, PageQuery, RespondFeedbackRequest, SubmitFeedbackRequest, Testimonial,
    UpdateFeedbackStatusRequest,
};
use crate::services::feedback_service;
use crate::utils::AppResult;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct TestimonialQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "Feedback",
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored"),
        (status = 400, description = "Invalid rating, category, priority or empty message")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<SubmitFeedbackRequest>,
) -> AppResult<HttpResponse> {
    let (ip_address, user_agent) = client_info(&req);
    let submitted = feedback_service::submit(&db, &request, &claims.sub, ip_address, user_agent).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "feedbackId": submitted.feedback_id,
        "message": submitted.message,
        "submissionTimestamp": submitted.submission_timestamp,
        "tracking": submitted.tracking
    })))
}

#[utoipa::path(
    get,
    path = "/api/feedback/my",
    tag = "Feedback",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses((status = 200, description = "The caller's feedback, newest first")),
    security(("bearer_auth" = []))
)]
pub async fn my_feedback(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = feedback_service::list_for_user(&db, &claims.sub, query.page, query.limit).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "feedback": page.items,
        "pagination": page.pagination
    })))
}

#[utoipa::path(
    get,
    path = "/api/feedback/{feedback_id}",
    tag = "Feedback",
    params(("feedback_id" = String, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "One feedback entry", body = FeedbackView),
        (status = 403, description = "Not the caller's feedback"),
        (status = 404, description = "Feedback not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let feedback = feedback_service::get_for(&db, &path, &claims).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "feedback": feedback })))
}

#[utoipa::path(
    get,
    path = "/api/feedback/admin/all",
    tag = "Feedback",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("status" = Option<String>, Query, description = "Status filter"),
        ("priority" = Option<String>, Query, description = "Priority filter"),
        ("rating" = Option<i32>, Query, description = "Exact rating")
    ),
    responses(
        (status = 200, description = "Feedback joined with the roster"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn admin_all(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<AdminFeedbackQuery>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let page = feedback_service::list_admin(&db, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "feedback": page.items,
        "pagination": page.pagination,
        "filters_applied": {
            "category": query.category,
            "status": query.status,
            "priority": query.priority,
            "rating": query.rating
        }
    })))
}

#[utoipa::path(
    post,
    path = "/api/feedback/{feedback_id}/respond",
    tag = "Feedback",
    params(("feedback_id" = String, Path, description = "Feedback id")),
    request_body = RespondFeedbackRequest,
    responses(
        (status = 200, description = "Response recorded"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Feedback not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn respond(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<RespondFeedbackRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let result = feedback_service::respond(&db, &path, &request, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "result": result })))
}

#[utoipa::path(
    put,
    path = "/api/feedback/{feedback_id}/status",
    tag = "Feedback",
    params(("feedback_id" = String, Path, description = "Feedback id")),
    request_body = UpdateFeedbackStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Feedback not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateFeedbackStatusRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let result = feedback_service::update_status(&db, &path, &request.status, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "result": result })))
}

#[utoipa::path(
    get,
    path = "/api/feedback/admin/analytics",
    tag = "Feedback",
    responses(
        (status = 200, description = "Overview, distributions and monthly trends"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analytics(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let analytics = feedback_service::analytics(&db).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "analytics": analytics })))
}

#[utoipa::path(
    get,
    path = "/api/feedback/testimonials",
    tag = "Feedback",
    params(("limit" = Option<i64>, Query, description = "At most 50")),
    responses((status = 200, description = "Public high-rated feedback", body = [Testimonial]))
)]
pub async fn testimonials(db: web::Data<MongoDB>, query: web::Query<TestimonialQuery>) -> AppResult<HttpResponse> {
    let testimonials = feedback_service::testimonials(&db, query.limit).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "testimonials": testimonials,
        "count": testimonials.len()
    })))
}
