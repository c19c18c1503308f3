use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::{
    EventUpdateRequest, MessageLogQuery, RsvpReminderRequest, SendBulkRequest, SendMessageRequest, SendOutcome,
    SendTemplateRequest,
};
use crate::services::whatsapp_service;
use crate::services::MessageGateway;
use crate::utils::{AppError, AppResult};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn require_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        Err(AppError::bad_request(format!("Field '{}' is required", field)))
    } else {
        Ok(())
    }
}

#[utoipa::path(
    get,
    path = "/api/whatsapp/status",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Gateway connection state"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn status(gateway: web::Data<dyn MessageGateway>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let status = gateway.status().await;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "status": status })))
}

#[utoipa::path(
    get,
    path = "/api/whatsapp/qr",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Pairing QR code"),
        (status = 403, description = "Admin access required"),
        (status = 502, description = "Gateway has no QR code")
    ),
    security(("bearer_auth" = []))
)]
pub async fn qr(gateway: web::Data<dyn MessageGateway>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let qr = gateway.qr().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "qr_data": qr })))
}

#[utoipa::path(
    get,
    path = "/api/whatsapp/templates",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Message templates and their variables"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn templates(claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "templates": whatsapp_service::templates()
    })))
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/send",
    tag = "WhatsApp",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Delivery outcome, failures included", body = SendOutcome),
        (status = 400, description = "Missing phone number or message"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send(
    db: web::Data<MongoDB>,
    gateway: web::Data<dyn MessageGateway>,
    claims: web::ReqData<Claims>,
    request: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    require_text(&request.phone_number, "phone_number")?;
    require_text(&request.message, "message")?;

    let outcome = whatsapp_service::send_message(&db, gateway.get_ref(), request.phone_number.trim(), &request.message).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/send-template",
    tag = "WhatsApp",
    request_body = SendTemplateRequest,
    responses(
        (status = 200, description = "Delivery outcome", body = SendOutcome),
        (status = 400, description = "Unknown template or missing phone number"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_template(
    db: web::Data<MongoDB>,
    gateway: web::Data<dyn MessageGateway>,
    claims: web::ReqData<Claims>,
    request: web::Json<SendTemplateRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    require_text(&request.phone_number, "phone_number")?;

    let outcome = whatsapp_service::send_template(
        &db,
        gateway.get_ref(),
        request.phone_number.trim(),
        &request.template_name,
        &request.variables,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/send-bulk",
    tag = "WhatsApp",
    request_body = SendBulkRequest,
    responses(
        (status = 200, description = "Per-recipient delivery report"),
        (status = 400, description = "No recipients"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_bulk(
    db: web::Data<MongoDB>,
    gateway: web::Data<dyn MessageGateway>,
    claims: web::ReqData<Claims>,
    request: web::Json<SendBulkRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    if request.recipients.is_empty() {
        return Err(AppError::bad_request("At least one recipient is required"));
    }

    let report =
        whatsapp_service::send_bulk(&db, gateway.get_ref(), &request.recipients, request.delay_seconds).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "results": report })))
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/rsvp-reminders",
    tag = "WhatsApp",
    request_body = RsvpReminderRequest,
    responses(
        (status = 200, description = "Reminder campaign outcome"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rsvp_reminders(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    gateway: web::Data<dyn MessageGateway>,
    claims: web::ReqData<Claims>,
    request: web::Json<RsvpReminderRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let outcome = whatsapp_service::send_rsvp_reminders(
        &db,
        gateway.get_ref(),
        request.days_before_deadline,
        &config.rsvp_base_url,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "result": outcome })))
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/event-updates",
    tag = "WhatsApp",
    request_body = EventUpdateRequest,
    responses(
        (status = 200, description = "Update campaign outcome"),
        (status = 400, description = "Empty message or unknown target group"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn event_updates(
    db: web::Data<MongoDB>,
    gateway: web::Data<dyn MessageGateway>,
    claims: web::ReqData<Claims>,
    request: web::Json<EventUpdateRequest>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let outcome =
        whatsapp_service::send_event_updates(&db, gateway.get_ref(), &request.update_message, &request.target_group)
            .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "result": outcome })))
}

#[utoipa::path(
    get,
    path = "/api/whatsapp/logs",
    tag = "WhatsApp",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size, at most 200"),
        ("phone_number" = Option<String>, Query, description = "Only this recipient")
    ),
    responses(
        (status = 200, description = "Message log page, newest first"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logs(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<MessageLogQuery>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let page = whatsapp_service::logs(&db, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "logs": page.items,
        "pagination": page.pagination
    })))
}

#[utoipa::path(
    get,
    path = "/api/whatsapp/analytics",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Delivery overview, status distribution and daily volume"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analytics(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let analytics = whatsapp_service::analytics(&db).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "analytics": analytics })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::services::auth_service;
    use crate::services::whatsapp_service::Delivery;
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct OfflineGateway;

    #[async_trait]
    impl MessageGateway for OfflineGateway {
        async fn status(&self) -> Value {
            json!({ "connected": false, "error": "Service unavailable" })
        }

        async fn qr(&self) -> AppResult<Value> {
            Err(AppError::Upstream("QR code unavailable (HTTP 503)".to_string()))
        }

        async fn deliver(&self, _phone_number: &str, _message: &str) -> Delivery {
            unreachable!("no delivery in these tests")
        }
    }

    fn token_for(role: &str) -> String {
        let config = AppConfig::for_tests();
        auth_service::issue_token(&config.jwt, &User::sample(role)).unwrap()
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppConfig::for_tests()))
                    .app_data(web::Data::from(Arc::new(OfflineGateway) as Arc<dyn MessageGateway>))
                    .service(
                        web::scope("/api/whatsapp")
                            .wrap(crate::middleware::AuthMiddleware)
                            .route("/status", web::get().to(status))
                            .route("/qr", web::get().to(qr))
                            .route("/templates", web::get().to(templates)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_status_reports_offline_gateway() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/whatsapp/status")
            .insert_header(("Authorization", format!("Bearer {}", token_for("admin"))))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"]["connected"], json!(false));
    }

    #[actix_web::test]
    async fn test_qr_failure_is_bad_gateway() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/whatsapp/qr")
            .insert_header(("Authorization", format!("Bearer {}", token_for("admin"))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_templates_require_admin() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/whatsapp/templates")
            .insert_header(("Authorization", format!("Bearer {}", token_for("invitee"))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/whatsapp/templates")
            .insert_header(("Authorization", format!("Bearer {}", token_for("admin"))))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["templates"].as_object().unwrap().len(), 5);
        assert_eq!(
            body["templates"]["rsvp_reminder"]["required_variables"],
            json!(["name", "deadline", "rsvp_link"])
        );
    }
}
