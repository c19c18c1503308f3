use crate::database::MongoDB;
use crate::middleware::Claims;
use crate::models::GalleryPhotoView;
use crate::services::gallery_service;
use crate::utils::{upload::UploadForm, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/gallery/upload",
    tag = "Gallery",
    request_body(content_type = "multipart/form-data", description = "`employeeId`, `eventVersion` and an image `file`"),
    responses(
        (status = 200, description = "Photo stored"),
        (status = 400, description = "Not an image, unknown event or photo limit reached")
    )
)]
pub async fn upload(db: web::Data<MongoDB>, payload: Multipart) -> AppResult<HttpResponse> {
    let mut form = UploadForm::from_multipart(payload).await?;
    let employee_id = form.require_field("employeeId")?;
    let event_version = form.require_field("eventVersion")?;
    let file = form.take_file()?;

    let photo_id = gallery_service::upload(&db, &employee_id, &event_version, &file).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Photo uploaded successfully",
        "photoId": photo_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/gallery/{event_version}",
    tag = "Gallery",
    params(("event_version" = String, Path, description = "e.g. PM Connect 3.0")),
    responses((status = 200, description = "Photos of the event, newest first", body = [GalleryPhotoView]))
)]
pub async fn by_event(db: web::Data<MongoDB>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let photos: Vec<GalleryPhotoView> = gallery_service::by_event(&db, &path)
        .await?
        .into_iter()
        .map(GalleryPhotoView::from)
        .collect();
    Ok(HttpResponse::Ok().json(photos))
}

#[utoipa::path(
    delete,
    path = "/api/gallery/{photo_id}",
    tag = "Gallery",
    params(("photo_id" = String, Path, description = "Photo id")),
    responses(
        (status = 200, description = "Photo deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Photo not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    claims.require_admin()?;
    let photo_id = path.into_inner();
    gallery_service::delete(&db, &photo_id).await?;
    log::info!("🗑️  Photo {} deleted", photo_id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Photo deleted successfully" })))
}
