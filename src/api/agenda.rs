use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::AgendaView;
use crate::services::agenda_service;
use crate::utils::{upload::UploadForm, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/agenda",
    tag = "Agenda",
    request_body(content_type = "multipart/form-data", description = "`title` and a PDF `file`"),
    responses(
        (status = 200, description = "Agenda replaced"),
        (status = 400, description = "Missing title or not a PDF"),
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
    let title = form.require_field("title")?;
    let file = form.take_file()?;
    log::info!("📅 POST /agenda - {} ({})", title, file.filename);

    let agenda_id = agenda_service::replace(&db, &title, &file).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Agenda uploaded successfully",
        "agendaId": agenda_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/agenda",
    tag = "Agenda",
    responses((status = 200, description = "Current agenda or a message", body = AgendaView))
)]
pub async fn current(db: web::Data<MongoDB>) -> AppResult<HttpResponse> {
    match agenda_service::current(&db).await? {
        Some(agenda) => Ok(HttpResponse::Ok().json(AgendaView::from(agenda))),
        None => Ok(HttpResponse::Ok().json(json!({ "message": "No agenda available" }))),
    }
}
